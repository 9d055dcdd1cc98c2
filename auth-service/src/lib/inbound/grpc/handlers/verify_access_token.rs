use tonic::Status;

use crate::domain::auth::ports::GatekeeperPort;
use crate::proto::VerifyAccessTokenRequest;
use crate::proto::VerifyAccessTokenResponse;

pub async fn verify_access_token(
    gatekeeper: &dyn GatekeeperPort,
    request: VerifyAccessTokenRequest,
) -> Result<VerifyAccessTokenResponse, Status> {
    let admission = gatekeeper.admit(&request.token).await.map_err(|e| {
        tracing::warn!("Access token rejected over gRPC: {}", e);
        Status::unauthenticated("Unauthenticated")
    })?;

    Ok(VerifyAccessTokenResponse {
        expires_at: admission.expires_at.timestamp(),
        subject: Some(admission.profile.into()),
    })
}

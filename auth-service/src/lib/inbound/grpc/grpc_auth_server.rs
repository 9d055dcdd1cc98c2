use std::sync::Arc;

use tonic::Request;
use tonic::Response;
use tonic::Status;

use super::handlers::verify_access_token;
use crate::domain::auth::ports::GatekeeperPort;
use crate::proto::auth_service_server::AuthService as AuthServiceProto;
use crate::proto::VerifyAccessTokenRequest;
use crate::proto::VerifyAccessTokenResponse;

pub struct AuthGrpcService {
    gatekeeper: Arc<dyn GatekeeperPort>,
}

impl AuthGrpcService {
    pub fn new(gatekeeper: Arc<dyn GatekeeperPort>) -> Self {
        Self { gatekeeper }
    }
}

#[tonic::async_trait]
impl AuthServiceProto for AuthGrpcService {
    async fn verify_access_token(
        &self,
        request: Request<VerifyAccessTokenRequest>,
    ) -> Result<Response<VerifyAccessTokenResponse>, Status> {
        let response =
            verify_access_token::verify_access_token(self.gatekeeper.as_ref(), request.into_inner())
                .await?;
        Ok(Response::new(response))
    }
}

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tower::Layer;
use tower::Service;

use super::claims::{ClaimValidator, Principal};
use super::error::AuthorizationError;
use super::token::{TokenCodec, TokenDecoder};
use crate::axum_integration::extract_token;
use crate::clock::Clock;

/// Turns the token header of a request into a [`Principal`]
#[derive(Clone)]
pub struct TokenVerifier {
    decoder: Arc<dyn TokenDecoder>,
    validator: ClaimValidator,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    pub fn new(
        decoder: Arc<dyn TokenDecoder>,
        validator: ClaimValidator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            decoder,
            validator,
            clock,
        }
    }

    /// Verifier using the codec's secret, issuer and clock
    pub fn from_codec(codec: Arc<TokenCodec>) -> Self {
        let validator = codec.validator();
        let clock = codec.clock();
        Self::new(codec, validator, clock)
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthorizationError> {
        let token = extract_token(headers).ok_or(AuthorizationError::MissingToken)?;

        let claims = self.decoder.decode(token).map_err(|e| {
            tracing::warn!("Rejected token: {}", e);
            AuthorizationError::InvalidToken(e.to_string())
        })?;

        self.validator
            .check(&claims, self.clock.now())
            .map_err(|e| {
                tracing::warn!(sub = %claims.sub, "Rejected token claims: {}", e);
                AuthorizationError::InvalidToken(e.to_string())
            })?;

        claims.principal().ok_or_else(|| {
            tracing::warn!("Rejected token with empty subject");
            AuthorizationError::InvalidToken("empty subject".to_string())
        })
    }
}

/// Middleware layer that requires a valid session token
///
/// On success the request is forwarded with the [`Principal`] in its
/// extensions. Every failure is answered with 401 and the inner service is
/// never called.
#[derive(Clone)]
pub struct RequireToken {
    verifier: Arc<TokenVerifier>,
}

impl RequireToken {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self::with_verifier(TokenVerifier::from_codec(codec))
    }

    pub fn with_verifier(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }
}

impl<S> Layer<S> for RequireToken {
    type Service = RequireTokenMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireTokenMiddleware {
            inner,
            verifier: self.verifier.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequireTokenMiddleware<S> {
    inner: S,
    verifier: Arc<TokenVerifier>,
}

impl<S> Service<Request> for RequireTokenMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let principal = match self.verifier.authenticate(request.headers()) {
            Ok(principal) => principal,
            Err(err) => return Box::pin(async move { Ok(err.into_response()) }),
        };

        tracing::debug!(principal = %principal, "Authenticated request");
        request.extensions_mut().insert(principal);

        Box::pin(async move { inner.call(request).await })
    }
}

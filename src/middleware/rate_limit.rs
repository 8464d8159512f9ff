use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::{Error, web};
use futures_util::future::{Ready, ready};

use crate::database::RedisService;
use crate::utils::error::CustomError;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Namespace for the counter, so limits on different routes don't share a window.
    pub name: &'static str,
    pub max_requests: u64,
    pub window_seconds: u64,
    pub message: &'static str,
}

/// Fixed-window, per-IP limiter. Without Redis (or when Redis errors) requests pass.
pub struct RateLimit {
    config: RateLimitConfig,
}

impl RateLimit {
    pub fn new(config: RateLimitConfig) -> Self {
        RateLimit { config }
    }

    /// 500 requests per 15 minutes.
    pub fn api() -> Self {
        Self::new(RateLimitConfig {
            name: "api",
            max_requests: 500,
            window_seconds: 15 * 60,
            message: "Too many requests from this IP, please try again after 15 minutes",
        })
    }

    /// 10 attempts per hour.
    pub fn auth() -> Self {
        Self::new(RateLimitConfig {
            name: "auth",
            max_requests: 10,
            window_seconds: 60 * 60,
            message: "Too many login attempts from this IP, please try again after an hour",
        })
    }

    /// 10 new posts per hour.
    pub fn create_post() -> Self {
        Self::new(RateLimitConfig {
            name: "create_post",
            max_requests: 10,
            window_seconds: 60 * 60,
            message: "Too many posts created from this IP, please try again after an hour",
        })
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
    config: RateLimitConfig,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let config = self.config.clone();

        Box::pin(async move {
            if let Some(redis) = req.app_data::<web::Data<RedisService>>().cloned() {
                let ip = req
                    .connection_info()
                    .realip_remote_addr()
                    .unwrap_or("unknown")
                    .to_string();
                let key = format!("{}:{}", config.name, ip);

                match redis
                    .is_rate_limited(&key, config.max_requests, config.window_seconds)
                    .await
                {
                    Ok(true) => {
                        log::warn!("Rate limit '{}' exceeded for {}", config.name, ip);
                        let err = CustomError::TooManyRequestsError(config.message.into());
                        return Ok(req.error_response(err).map_into_right_body());
                    }
                    Ok(false) => {}
                    Err(e) => log::warn!("Rate limit Redis error (allowing request): {}", e),
                }
            }

            service.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test as actix_test};

    #[test]
    fn presets_match_forum_limits() {
        assert_eq!(RateLimit::api().config.max_requests, 500);
        assert_eq!(RateLimit::api().config.window_seconds, 900);
        assert_eq!(RateLimit::auth().config.max_requests, 10);
        assert_eq!(RateLimit::create_post().config.window_seconds, 3600);
    }

    #[actix_web::test]
    async fn passes_through_without_redis() {
        let app = actix_test::init_service(
            App::new().service(
                web::resource("/ping")
                    .wrap(RateLimit::api())
                    .to(|| async { HttpResponse::Ok().finish() }),
            ),
        )
        .await;

        for _ in 0..3 {
            let resp =
                actix_test::call_service(&app, actix_test::TestRequest::get().uri("/ping").to_request()).await;
            assert!(resp.status().is_success());
        }
    }
}

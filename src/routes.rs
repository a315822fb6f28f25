use crate::{
    api::{attendance, dashboard, employees, leave_request, profile, settings, wfh_request},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    // only fails on a zero period or burst, both excluded above
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let otp_limiter = Arc::new(build_limiter(config.rate_otp_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/otp/send")
                    .wrap(otp_limiter.clone())
                    .route(web::post().to(handlers::send_otp)),
            )
            .service(
                web::resource("/otp/verify")
                    .wrap(otp_limiter.clone())
                    .route(web::post().to(handlers::verify_otp)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/session").route(web::get().to(handlers::session)))
            .service(
                web::scope("/attendance")
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(web::resource("/check-out").route(web::post().to(attendance::check_out)))
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(web::resource("/history").route(web::get().to(attendance::history)))
                    .service(
                        web::resource("/calendar").route(web::get().to(attendance::calendar_week)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    .service(web::resource("/mine").route(web::get().to(leave_request::my_leaves)))
                    .service(
                        web::resource("/summary").route(web::get().to(leave_request::leave_summary)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/wfh")
                    // /wfh
                    .service(
                        web::resource("")
                            .route(web::get().to(wfh_request::wfh_list))
                            .route(web::post().to(wfh_request::create_wfh)),
                    )
                    .service(web::resource("/mine").route(web::get().to(wfh_request::my_wfh)))
                    .service(web::resource("/stats").route(web::get().to(wfh_request::wfh_stats)))
                    .service(web::resource("/export").route(web::get().to(wfh_request::export_wfh)))
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(wfh_request::approve_wfh)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(wfh_request::reject_wfh)),
                    ),
            )
            .service(
                web::scope("/dashboard")
                    .service(web::resource("").route(web::get().to(dashboard::daily_counts)))
                    .service(web::resource("/records").route(web::get().to(dashboard::records)))
                    .service(
                        web::resource("/activity").route(web::get().to(dashboard::recent_activity)),
                    ),
            )
            .service(
                web::scope("/settings")
                    .service(web::resource("").route(web::get().to(settings::view_settings)))
                    .service(
                        web::resource("/daily").route(web::put().to(settings::save_daily_settings)),
                    )
                    .service(
                        web::resource("/meetings").route(web::post().to(settings::schedule_meeting)),
                    )
                    .service(
                        web::resource("/change-request")
                            .route(web::post().to(settings::request_method_change)),
                    )
                    .service(
                        web::resource("/leave-policy")
                            .route(web::put().to(settings::save_leave_policy)),
                    ),
            )
            .service(web::resource("/meetings/mine").route(web::get().to(settings::my_meetings)))
            .service(
                web::resource("/profile")
                    .route(web::get().to(profile::get_profile))
                    .route(web::put().to(profile::update_profile)),
            )
            .service(
                web::resource("/profile/picture")
                    // oversized bodies up to 4x the limit still get a readable error
                    .app_data(web::PayloadConfig::new(config.max_upload_bytes.saturating_mul(4)))
                    .route(web::put().to(profile::upload_picture)),
            )
            .service(
                web::resource("/account/complete").route(web::post().to(profile::complete_account)),
            )
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::get().to(employees::list_employees))
                            .route(web::post().to(employees::create_employee)),
                    )
                    // /employees/{id}/status
                    .service(
                        web::resource("/{id}/status").route(web::put().to(employees::set_status)),
                    ),
            ),
    );
}

// LOGIN (OTP or email/password)
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token + rotated refresh_token

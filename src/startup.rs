use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::middleware::{JwtMiddleware, RequestLogger};
use crate::routes::{
    get_profile, get_user_by_id, health_check, list_users, login, logout, refresh, register,
    update_profile,
};
use crate::session::SessionService;
use crate::store::UserStore;
use crate::user::Role;

/// Roles allowed on the admin listing and lookup routes
const ADMIN_ROLES: &[Role] = &[Role::Admin];

pub fn run(
    listener: TcpListener,
    store: Arc<dyn UserStore>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    settings.application.environment.install();

    let sessions = SessionService::new(store, &settings);
    let verifier = sessions.verifier().clone();
    let sessions = web::Data::new(sessions);

    let server = HttpServer::new(move || {
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            AppError::from(ValidationError::MalformedBody(err.to_string())).into()
        });

        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(RequestLogger)

            // Shared state
            .app_data(json_config)
            .app_data(sessions.clone())

            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/users")
                    // Public routes
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))

                    // Authenticated routes
                    .service(
                        web::resource("/logout")
                            .wrap(JwtMiddleware::new(verifier.clone()))
                            .route(web::post().to(logout)),
                    )
                    .service(
                        web::resource("/profile")
                            .wrap(JwtMiddleware::new(verifier.clone()))
                            .route(web::get().to(get_profile))
                            .route(web::put().to(update_profile)),
                    )

                    // Admin routes; `/all` must be registered before `/{id}`
                    .service(
                        web::resource("/all")
                            .wrap(JwtMiddleware::new(verifier.clone()).require_roles(ADMIN_ROLES))
                            .route(web::get().to(list_users)),
                    )
                    .service(
                        web::resource("/{id}")
                            .wrap(JwtMiddleware::new(verifier.clone()).require_roles(ADMIN_ROLES))
                            .route(web::get().to(get_user_by_id)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

// src/api/routes.rs
use super::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .service(
            web::scope("/api")
                .route("/ws", web::get().to(handlers::ws_handler))
                .service(
                    web::scope("/auth")
                        .route("/login", web::post().to(handlers::login))
                        .route("/logout", web::post().to(handlers::logout))
                        .route("/me", web::get().to(handlers::me))
                        .route("/update-password", web::post().to(handlers::update_password)),
                )
                .service(
                    web::scope("/users")
                        .route("/profile", web::get().to(handlers::get_profile))
                        .route("/profile", web::put().to(handlers::update_profile))
                        .route("/profile/upload", web::post().to(handlers::upload_profile_image))
                        .route("/reset-password", web::put().to(handlers::reset_password)),
                )
                .service(
                    web::scope("/quiz")
                        .route("/active", web::get().to(handlers::get_active_quiz))
                        .route("/submit", web::post().to(handlers::submit_quiz))
                        .route("/history", web::get().to(handlers::get_history)),
                )
                .service(
                    web::scope("/admin")
                        .route("/import", web::post().to(handlers::import))
                        .route("/users", web::get().to(handlers::list_users))
                        .route("/quizzes", web::get().to(handlers::list_quizzes))
                        .route("/quizzes", web::post().to(handlers::create_quiz))
                        .route("/quizzes/generate", web::post().to(handlers::generate_quiz))
                        .route("/quizzes/validate", web::post().to(handlers::validate_quiz))
                        .route("/quizzes/parse-text", web::post().to(handlers::parse_text))
                        .route("/quizzes/{id}", web::get().to(handlers::get_quiz))
                        .route("/quizzes/{id}", web::put().to(handlers::update_quiz))
                        .route("/quizzes/{id}/approve", web::post().to(handlers::approve_quiz))
                        .route("/quizzes/{id}/activate", web::post().to(handlers::activate_quiz))
                        .route("/analytics", web::get().to(handlers::dashboard))
                        .route(
                            "/analytics/users/{id}/history",
                            web::get().to(handlers::user_history),
                        )
                        .route(
                            "/analytics/attempts/{id}",
                            web::get().to(handlers::attempt_details),
                        ),
                )
                .service(
                    web::scope("/content")
                        .route("/languages", web::get().to(handlers::languages))
                        .route("/translations", web::get().to(handlers::translations))
                        .route("/translations", web::post().to(handlers::upsert_translation)),
                ),
        );
}

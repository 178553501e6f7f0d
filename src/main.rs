use actix_cors::Cors;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, Responder, middleware, web};
use incharge::api::handlers::WsBroker;
use incharge::api::{AppState, configure_routes};
use incharge::config::AppConfig;
use incharge::{banner, database, scheduler};
use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::path::PathBuf;

#[derive(RustEmbed)]
#[folder = "static/"]
struct StaticAssets;

fn load_config() -> incharge::errors::Result<AppConfig> {
    match std::env::var("INCHARGE_CONFIG") {
        Ok(path) if !path.trim().is_empty() => {
            log::info!("Loading configuration from {}", path);
            AppConfig::from_toml_file(&PathBuf::from(path))
        }
        _ => AppConfig::from_env(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    banner::print_banner();

    if let Err(e) = dotenvy::dotenv() {
        eprintln!("⚠️  No .env file loaded ({}); using the process environment", e);
    }

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let app_config = load_config().map_err(std::io::Error::other)?;

    let pool = database::init_db(&app_config.database_url)
        .await
        .map_err(std::io::Error::other)?;
    println!("✅ Database ready at {}", app_config.database_url);

    if let Some(admin) = &app_config.admin {
        match database::users::ensure_admin(&pool, admin).await {
            Ok(true) => log::info!("Created admin account {}", admin.email),
            Ok(false) => {}
            Err(e) => log::error!("Could not create admin account: {}", e),
        }
    }

    std::fs::create_dir_all(&app_config.uploads_dir)?;

    let state = AppState::new(app_config, pool);
    let broker = WsBroker::new();

    if state.config.scheduler_enabled {
        actix_web::rt::spawn(scheduler::run(state.clone()));
    }

    let bind_addr = (state.config.host.clone(), state.config.port);
    let uploads_dir = state.config.uploads_dir.clone();

    println!("🚀 Starting server...");
    println!("📊 Frontend available at http://{}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(broker.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
            .service(actix_files::Files::new("/uploads", uploads_dir.clone()))
            .route("/{_:.*}", web::get().to(static_file_handler))
    })
    .bind(bind_addr)?
    .run()
    .await
}

async fn static_file_handler(req: HttpRequest) -> impl Responder {
    let path = match req.path().trim_start_matches('/') {
        "" => "index.html",
        p => p,
    };

    match StaticAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(Cow::into_owned(content.data))
        }
        // Client-side routes fall back to the SPA shell.
        None => match StaticAssets::get("index.html") {
            Some(index) => HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(Cow::into_owned(index.data)),
            None => HttpResponse::NotFound().body("404 Not Found"),
        },
    }
}

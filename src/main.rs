use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::{self, Write};

use khatma_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml()
        .map_err(|e| io::Error::other(format!("Failed to load configuration: {e}")))?;

    let pool = create_pool(&config.database)
        .await
        .map_err(|e| io::Error::other(format!("Failed to connect to the database: {e}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| io::Error::other(format!("Failed to run database migrations: {e}")))?;

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());
    let user_service = UserService::new(pool.clone());
    let deceased_service = DeceasedService::new(pool.clone());
    let khatma_service = KhatmaService::new(pool.clone(), config.site.clone());
    let part_service = PartService::new(pool.clone());
    let reading_service = ReadingService::new(pool.clone());
    let group_service = GroupService::new(pool.clone());
    let notification_service = NotificationService::new(pool.clone());
    let memorial_service = MemorialService::new(pool.clone(), config.memorial.clone());

    tasks::spawn_all(memorial_service, &config.memorial);

    log::info!(
        "Starting {} at {}:{}",
        config.site.name,
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(deceased_service.clone()))
            .app_data(web::Data::new(khatma_service.clone()))
            .app_data(web::Data::new(part_service.clone()))
            .app_data(web::Data::new(reading_service.clone()))
            .app_data(web::Data::new(group_service.clone()))
            .app_data(web::Data::new(notification_service.clone()))
            .configure(swagger_config)
            .configure(handlers::health_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::user_config)
                    .configure(handlers::deceased_config)
                    .configure(handlers::khatma_config)
                    .configure(handlers::reading_config)
                    .configure(handlers::group_config)
                    .configure(handlers::notification_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}

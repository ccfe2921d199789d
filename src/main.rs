use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use tracing::{info, warn};

use geodiscounts::api::{AppStartTime, discount_routes, health_routes, retailer_routes};
use geodiscounts::cache::CacheFactory;
use geodiscounts::config::{get_config, init_config};
use geodiscounts::geoip::LocationResolver;
use geodiscounts::repository::RepositoryFactory;
use geodiscounts::system::init_logging;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 记录程序启动时间
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    dotenvy::dotenv().ok();
    init_config();
    let config = get_config();

    // guard 需要存活到进程结束，否则日志会丢失
    let _log_guard = init_logging(&config.logging);

    let repository = RepositoryFactory::create(&config.database)
        .await
        .map_err(|e| std::io::Error::other(e.format_simple()))?;
    info!("Using repository backend: {}", config.database.backend);

    let cache = CacheFactory::create(&config.cache)
        .map_err(|e| std::io::Error::other(e.format_simple()))?;

    let resolver = LocationResolver::from_config(&config.geolocation, cache);
    info!("Using geolocation provider: {}", resolver.provider_name());

    if config.geolocation.dev_fallback {
        warn!("Dev fallback enabled: loopback/test IPs resolve to the fixed test location");
    }

    if config.server.trusted_proxies.is_empty() {
        warn!(
            "Client IP extraction: auto-detect mode enabled. \
             Connections from private IPs will use X-Forwarded-For. \
             To disable, configure server.trusted_proxies explicitly."
        );
    } else {
        info!(
            "Client IP extraction: explicit trusted proxies configured: {:?}",
            config.server.trusted_proxies
        );
    }

    let cpu_count = config.server.cpu_count.min(32);
    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Compress::default())
            .app_data(web::Data::new(repository.clone()))
            .app_data(web::Data::new(resolver.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::PayloadConfig::new(1024 * 1024))
            .wrap(
                DefaultHeaders::new()
                    .add(("Connection", "keep-alive"))
                    .add(("Keep-Alive", "timeout=30, max=1000")),
            )
            .service(
                web::scope("/api/v1")
                    .service(discount_routes())
                    .service(retailer_routes()),
            )
            .service(health_routes())
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count)
    .bind(bind_address)?
    .run()
    .await
}

use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use time::Duration;
use url::Url;

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub access_token_ttl: Duration,
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub stripe_secret_key: SecretString,
    pub stripe_webhook_secret: SecretString,
    /// Where Stripe redirects after checkout. Defaults derive from APP_ORIGIN.
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
    /// Stripe price ids for the paid tiers.
    pub price_basic: String,
    pub price_pro: String,
    pub price_elite: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());

        let access_token_ttl_secs: i64 = get_env_default("ACCESS_TOKEN_TTL_SECS", 86_400);

        let app_origin: Url = get_env("APP_ORIGIN");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");

        let stripe_secret_key: SecretString =
            SecretString::new(get_env::<String>("STRIPE_SECRET_KEY").into());
        let stripe_webhook_secret: SecretString =
            SecretString::new(get_env::<String>("STRIPE_WEBHOOK_SECRET").into());

        let checkout_success_url: String = get_env_default(
            "CHECKOUT_SUCCESS_URL",
            format!(
                "{}billing/success?session_id={{CHECKOUT_SESSION_ID}}",
                app_origin
            ),
        );
        let checkout_cancel_url: String =
            get_env_default("CHECKOUT_CANCEL_URL", format!("{}billing", app_origin));

        let price_basic: String = get_env("STRIPE_PRICE_BASIC");
        let price_pro: String = get_env("STRIPE_PRICE_PRO");
        let price_elite: String = get_env("STRIPE_PRICE_ELITE");

        Self {
            jwt_secret,
            access_token_ttl: Duration::seconds(access_token_ttl_secs),
            app_origin,
            cors_origin,
            bind_addr,
            database_url,
            stripe_secret_key,
            stripe_webhook_secret,
            checkout_success_url,
            checkout_cancel_url,
            price_basic,
            price_pro,
            price_elite,
        }
    }
}

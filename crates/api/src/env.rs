use cardvault_common::EnvVars;

pub struct ApiServerEnv {
    pub secret_salt: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
}

impl EnvVars for ApiServerEnv {
    fn load() -> Self {
        Self {
            secret_salt: std::env::var("SECRET_SALT").unwrap(),
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY").unwrap(),
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").unwrap(),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "SECRET_SALT" => self.secret_salt.clone(),
            "STRIPE_SECRET_KEY" => self.stripe_secret_key.clone(),
            "STRIPE_WEBHOOK_SECRET" => self.stripe_webhook_secret.clone(),
            _ => panic!("{} is not set", key),
        }
    }
}

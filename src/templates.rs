//! Minijinja template engine configuration with embedded and auto-reload modes.

use crate::config::Config;
use crate::http::AppEngine;

/// Build the template engine for the enabled feature set
pub fn build_engine(config: &Config) -> AppEngine {
    #[cfg(feature = "embed")]
    {
        AppEngine::from(embed_env::build_env(
            config.external_base.clone(),
            config.version.clone(),
        ))
    }

    #[cfg(feature = "reload")]
    {
        AppEngine::from(reload_env::build_env(
            config.http_templates_path.clone(),
            config.external_base.clone(),
            config.version.clone(),
        ))
    }

    #[cfg(not(any(feature = "reload", feature = "embed")))]
    {
        AppEngine::from(path_env::build_env(
            config.http_templates_path.clone(),
            config.external_base.clone(),
            config.version.clone(),
        ))
    }
}

#[cfg(feature = "reload")]
mod reload_env {
    use minijinja::{Environment, path_loader};
    use minijinja_autoreload::AutoReloader;

    pub fn build_env(template_path: String, base: String, version: String) -> AutoReloader {
        AutoReloader::new(move |notifier| {
            let mut env = Environment::new();
            env.set_trim_blocks(true);
            env.set_lstrip_blocks(true);
            env.add_global("base", base.clone());
            env.add_global("version", version.clone());
            env.set_loader(path_loader(&template_path));
            notifier.set_fast_reload(true);
            notifier.watch_path(&template_path, true);
            Ok(env)
        })
    }
}

#[cfg(feature = "embed")]
mod embed_env {
    use minijinja::Environment;

    pub fn build_env(base: String, version: String) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_global("base", base);
        env.add_global("version", version);
        minijinja_embed::load_templates!(&mut env);
        env
    }
}

#[cfg(not(any(feature = "reload", feature = "embed")))]
mod path_env {
    use minijinja::{Environment, path_loader};

    pub fn build_env(template_path: String, base: String, version: String) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_global("base", base);
        env.add_global("version", version);
        env.set_loader(path_loader(template_path));
        env
    }
}

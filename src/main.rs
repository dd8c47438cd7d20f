use solegen::{
    logger, AspectRatio, BedrockConfig, BedrockProvider, Dimensions, GenerationRequest,
    GenerationRouter, GenerationSettings, ImageProvider, Intensity, PollinationsConfig,
    PollinationsProvider, PromptBuilder, RouterConfig, Side, StabilityConfig, StabilityProvider,
    TattooOptions,
};
use std::env;
use std::fs;
use std::sync::Arc;

fn demo_settings() -> GenerationSettings {
    let mut settings = GenerationSettings::new()
        .with_side(Side::Left)
        .with_detail("Tätowiert")
        .with_detail("Hoher Spann");
    settings.scene = "Strand".to_string();
    settings.lighting = "Goldene Stunde".to_string();
    settings.tattoos = Some(TattooOptions {
        enabled: true,
        motif: "floral".to_string(),
        placement: vec!["ankle".to_string()],
        intensity: Intensity::Light,
    });
    settings
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_loaded = dotenv::dotenv().is_ok();

    logger::init_with_config(logger::LoggerConfig::development())?;
    if !env_loaded {
        log::warn!("No .env file found, using system environment variables");
    }

    let settings = match env::args().nth(1) {
        Some(path) => {
            log::info!("Loading generation settings from {}", path);
            serde_json::from_str(&fs::read_to_string(&path)?)?
        }
        None => demo_settings(),
    };

    let prompts = PromptBuilder::new().build(&settings)?;
    log::info!("Positive prompt: {}", prompts.positive);
    log::info!("Negative prompt: {}", prompts.negative);

    let router_config = RouterConfig::from_env();
    router_config.validate()?;
    logger::log_router_config(&router_config);

    let premium: Arc<dyn ImageProvider> = match env::var("SOLEGEN_PREMIUM_PROVIDER").as_deref() {
        Ok("stability") => Arc::new(StabilityProvider::new(StabilityConfig::from_env())),
        _ => Arc::new(BedrockProvider::new(BedrockConfig::from_env()).await),
    };
    let free: Arc<dyn ImageProvider> =
        Arc::new(PollinationsProvider::new(PollinationsConfig::from_env()));

    for provider in [&premium, &free] {
        let caps = provider.capabilities();
        log::info!(
            "Provider '{}': max {}x{}, inpainting: {}, cost/image: ${:.3}, auth: {}",
            provider.id(),
            caps.max_width,
            caps.max_height,
            caps.supports_inpainting,
            caps.cost_per_image,
            caps.requires_auth
        );
    }

    let router = GenerationRouter::new(premium, free, router_config);
    let entitled = env::var("SOLEGEN_PREMIUM_ENTITLED")
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false);

    let request = GenerationRequest::from_prompts(prompts, Dimensions::Aspect(AspectRatio::Portrait))
        .with_metadata("source", serde_json::json!("cli"));

    match router.generate(&request, entitled).await {
        Ok(result) => {
            log::info!("Image generated by '{}' (cost ${:.3})", result.provider, result.cost);
            if result.image_url.starts_with("data:") {
                log::info!("Image data length: {} characters", result.image_url.len());
            } else {
                log::info!("Image URL: {}", result.image_url);
            }
            Ok(())
        }
        Err(e) if e.is_policy_violation() => {
            log::error!("Content not allowed: {}", e);
            Err(e.into())
        }
        Err(e) => {
            log::error!("{}", e);
            Err(e.into())
        }
    }
}

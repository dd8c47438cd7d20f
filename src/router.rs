//! Routes one generation request to a provider and applies the fallback policy.
//!
//! Per call: select provider → validate → generate → on a technical failure,
//! at most one fallback attempt against the default provider. Policy
//! rejections are never retried anywhere else.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::{
    config::RouterConfig,
    error::{ErrorCode, GenerationError, RouterError},
    models::{GenerationRequest, GenerationResult, ProviderId, ValidationResult},
    providers::{policy, ImageProvider},
    telemetry::{FailureType, LogTelemetrySink, TelemetryEvent, TelemetrySink},
};

pub struct GenerationRouter {
    premium: Arc<dyn ImageProvider>,
    default_provider: Arc<dyn ImageProvider>,
    config: RouterConfig,
    telemetry: Arc<dyn TelemetrySink>,
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// An explicit non-policy code wins over policy wording in the message, so an
/// IAM "policy" in an access-denied error stays a technical failure.
fn is_policy_failure(error: &GenerationError) -> bool {
    match error.code {
        ErrorCode::Policy => true,
        ErrorCode::Unknown => policy::mentions_policy(&error.message),
        _ => false,
    }
}

fn describe_metadata(request: &GenerationRequest) -> String {
    serde_json::to_string(request.metadata()).unwrap_or_else(|_| "{}".to_string())
}

fn violation_from_validation(provider: &ProviderId, validation: ValidationResult) -> RouterError {
    RouterError::PolicyViolation {
        provider: provider.clone(),
        reason: validation
            .reason
            .unwrap_or_else(|| "Prompt rejected by content policy".to_string()),
        matched_terms: validation.matched_terms,
    }
}

fn violation_from_error(provider: &ProviderId, error: GenerationError) -> RouterError {
    RouterError::PolicyViolation {
        provider: provider.clone(),
        reason: error.message,
        matched_terms: Vec::new(),
    }
}

impl GenerationRouter {
    /// Telemetry goes to the log until a sink is set with [`Self::with_telemetry`].
    pub fn new(
        premium: Arc<dyn ImageProvider>,
        default_provider: Arc<dyn ImageProvider>,
        config: RouterConfig,
    ) -> Self {
        Self {
            premium,
            default_provider,
            config,
            telemetry: Arc::new(LogTelemetrySink),
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// The kill-switch wins over entitlement; entitlement only counts while
    /// the premium rollout is on.
    pub fn select_provider(&self, is_premium_entitled: bool) -> &Arc<dyn ImageProvider> {
        if self.config.premium_kill_switch {
            &self.default_provider
        } else if is_premium_entitled && self.config.premium_rollout {
            &self.premium
        } else {
            &self.default_provider
        }
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
        is_premium_entitled: bool,
    ) -> Result<GenerationResult, RouterError> {
        let request_id = Uuid::new_v4().to_string();
        let provider = self.select_provider(is_premium_entitled);
        log::info!(
            "Routing request {} to provider '{}' (entitled: {}, metadata: {})",
            request_id,
            provider.id(),
            is_premium_entitled,
            describe_metadata(request)
        );

        let validation = match self.validate(provider.as_ref(), request).await {
            Ok(validation) => validation,
            Err(error) => {
                // Fail closed: the fallback path skips validation by default.
                self.record_failure(
                    request,
                    &request_id,
                    provider.id(),
                    FailureType::Technical,
                    &error,
                    None,
                );
                return Err(error.into());
            }
        };

        if !validation.allowed {
            log::warn!(
                "Request {} rejected by '{}' policy: {:?}",
                request_id,
                provider.id(),
                validation.matched_terms
            );
            let reason = validation.reason.clone().unwrap_or_default();
            self.record(
                request,
                TelemetryEvent::failure(
                    &request_id,
                    provider.id(),
                    FailureType::Policy,
                    reason,
                    None,
                ),
            );
            return Err(violation_from_validation(provider.id(), validation));
        }

        let started = Instant::now();
        match self.attempt(provider.as_ref(), request).await {
            Ok(mut result) => {
                result.provider = provider.id().clone();
                self.record(
                    request,
                    TelemetryEvent::success(
                        &request_id,
                        provider.id(),
                        elapsed_ms(started),
                        result.cost,
                    ),
                );
                Ok(result)
            }
            Err(error) => {
                let latency = elapsed_ms(started);
                if is_policy_failure(&error) {
                    log::warn!("Request {} blocked by '{}': {}", request_id, provider.id(), error);
                    self.record_failure(
                        request,
                        &request_id,
                        provider.id(),
                        FailureType::Policy,
                        &error,
                        Some(latency),
                    );
                    return Err(violation_from_error(provider.id(), error));
                }

                log::error!("Request {} failed on '{}': {}", request_id, provider.id(), error);
                self.record_failure(
                    request,
                    &request_id,
                    provider.id(),
                    FailureType::Technical,
                    &error,
                    Some(latency),
                );

                if !self.should_fall_back(provider.id()) {
                    return Err(error.into());
                }
                self.fall_back(&request_id, request).await
            }
        }
    }

    fn should_fall_back(&self, failed: &ProviderId) -> bool {
        self.config.fallback_enabled && failed != self.default_provider.id()
    }

    async fn fall_back(
        &self,
        request_id: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, RouterError> {
        let fallback = self.default_provider.as_ref();
        log::warn!("Request {} falling back to '{}'", request_id, fallback.id());

        if self.config.revalidate_on_fallback {
            let validation = match self.validate(fallback, request).await {
                Ok(validation) => validation,
                Err(error) => {
                    self.record_failure(
                        request,
                        request_id,
                        fallback.id(),
                        FailureType::Technical,
                        &error,
                        None,
                    );
                    return Err(error.into());
                }
            };
            if !validation.allowed {
                let reason = validation.reason.clone().unwrap_or_default();
                self.record(
                    request,
                    TelemetryEvent::failure(
                        request_id,
                        fallback.id(),
                        FailureType::Policy,
                        reason,
                        None,
                    ),
                );
                return Err(violation_from_validation(fallback.id(), validation));
            }
        }

        let started = Instant::now();
        match self.attempt(fallback, request).await {
            Ok(mut result) => {
                result.provider = fallback.id().clone();
                self.record(
                    request,
                    TelemetryEvent::fallback(
                        request_id,
                        fallback.id(),
                        elapsed_ms(started),
                        result.cost,
                    ),
                );
                Ok(result)
            }
            Err(error) => {
                let latency = Some(elapsed_ms(started));
                if is_policy_failure(&error) {
                    self.record_failure(
                        request,
                        request_id,
                        fallback.id(),
                        FailureType::Policy,
                        &error,
                        latency,
                    );
                    return Err(violation_from_error(fallback.id(), error));
                }
                log::error!("Fallback for request {} failed: {}", request_id, error);
                self.record_failure(
                    request,
                    request_id,
                    fallback.id(),
                    FailureType::Technical,
                    &error,
                    latency,
                );
                Err(error.into())
            }
        }
    }

    async fn validate(
        &self,
        provider: &dyn ImageProvider,
        request: &GenerationRequest,
    ) -> Result<ValidationResult, GenerationError> {
        self.with_timeout(provider.id(), "validation", async {
            Ok(provider.validate_prompt(request.prompt()).await)
        })
        .await
    }

    async fn attempt(
        &self,
        provider: &dyn ImageProvider,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        self.with_timeout(provider.id(), "generation", provider.generate_image(request))
            .await
    }

    async fn with_timeout<T, F>(
        &self,
        provider: &ProviderId,
        stage: &str,
        future: F,
    ) -> Result<T, GenerationError>
    where
        F: Future<Output = Result<T, GenerationError>>,
    {
        let limit: Duration = self.config.attempt_timeout;
        match tokio::time::timeout(limit, future).await {
            Ok(outcome) => outcome,
            Err(_) => Err(GenerationError::timeout(format!(
                "{} {} exceeded {}ms",
                provider,
                stage,
                limit.as_millis()
            ))),
        }
    }

    fn record(&self, request: &GenerationRequest, event: TelemetryEvent) {
        self.telemetry
            .record(event.with_metadata(request.metadata().clone()));
    }

    fn record_failure(
        &self,
        request: &GenerationRequest,
        request_id: &str,
        provider: &ProviderId,
        failure_type: FailureType,
        error: &GenerationError,
        latency_ms: Option<u64>,
    ) {
        self.record(
            request,
            TelemetryEvent::failure(request_id, provider, failure_type, error.to_string(), latency_ms),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouterErrorKind;
    use crate::models::{ProviderCapabilities, ResultMetadata};
    use crate::providers::bedrock;
    use crate::telemetry::{MemoryTelemetrySink, TelemetryStatus};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PREMIUM: &str = "premium";
    const FREE: &str = "free";

    #[derive(Clone)]
    enum Outcome {
        Succeed,
        Fail(GenerationError),
        Hang,
    }

    struct MockProvider {
        id: ProviderId,
        outcome: Outcome,
        forbidden: Vec<&'static str>,
        hang_validation: bool,
        cost: f64,
        validate_calls: AtomicUsize,
        generate_calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: &str, outcome: Outcome) -> Self {
            Self {
                id: ProviderId::from(id),
                outcome,
                forbidden: Vec::new(),
                hang_validation: false,
                cost: if id == FREE { 0.0 } else { 0.01 },
                validate_calls: AtomicUsize::new(0),
                generate_calls: AtomicUsize::new(0),
            }
        }

        fn forbidding(mut self, terms: &[&'static str]) -> Self {
            self.forbidden = terms.to_vec();
            self
        }

        fn hanging_validation(mut self) -> Self {
            self.hang_validation = true;
            self
        }

        fn validations(&self) -> usize {
            self.validate_calls.load(Ordering::SeqCst)
        }

        fn generations(&self) -> usize {
            self.generate_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageProvider for MockProvider {
        fn id(&self) -> &ProviderId {
            &self.id
        }

        async fn validate_prompt(&self, prompt: &str) -> ValidationResult {
            self.validate_calls.fetch_add(1, Ordering::SeqCst);
            if self.hang_validation {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            policy::check_prompt(prompt, &self.forbidden)
        }

        async fn generate_image(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResult, GenerationError> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Outcome::Succeed => Ok(GenerationResult {
                    image_url: format!("https://img.test/{}.png", self.id),
                    provider: self.id.clone(),
                    metadata: ResultMetadata {
                        prompt: request.prompt().to_string(),
                        seed: Some(7),
                        model: Some("mock".into()),
                        width: 1024,
                        height: 1024,
                    },
                    cost: self.cost,
                }),
                Outcome::Fail(error) => Err(error.clone()),
                Outcome::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(GenerationError::unknown("unreachable"))
                }
            }
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                max_width: 1024,
                max_height: 1024,
                supports_inpainting: false,
                cost_per_image: self.cost,
                requires_auth: false,
            }
        }
    }

    struct Harness {
        premium: Arc<MockProvider>,
        free: Arc<MockProvider>,
        sink: Arc<MemoryTelemetrySink>,
        router: GenerationRouter,
    }

    fn harness(premium: MockProvider, free: MockProvider, config: RouterConfig) -> Harness {
        let premium = Arc::new(premium);
        let free = Arc::new(free);
        let sink = Arc::new(MemoryTelemetrySink::new());
        let router = GenerationRouter::new(premium.clone(), free.clone(), config)
            .with_telemetry(sink.clone());
        Harness {
            premium,
            free,
            sink,
            router,
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("pair of feet on a beach").with_negative_prompt("blurry")
    }

    #[tokio::test]
    async fn entitled_caller_reaches_premium() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Succeed),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default(),
        );
        let result = h.router.generate(&request(), true).await.unwrap();

        assert_eq!(result.provider.as_str(), PREMIUM);
        assert_eq!(result.cost, 0.01);
        assert_eq!(h.free.generations(), 0);
        let events = h.sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, TelemetryStatus::Success);
        assert_eq!(events[0].cost, Some(0.01));
        assert!(events[0].latency_ms.is_some());
    }

    #[tokio::test]
    async fn kill_switch_beats_entitlement() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Succeed),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default().with_premium_kill_switch(true),
        );
        for entitled in [true, false] {
            let result = h.router.generate(&request(), entitled).await.unwrap();
            assert_eq!(result.provider.as_str(), FREE);
            assert_eq!(result.cost, 0.0);
        }
        assert_eq!(h.premium.validations(), 0);
        assert_eq!(h.premium.generations(), 0);
    }

    #[tokio::test]
    async fn unentitled_or_unreleased_premium_uses_default() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Succeed),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default(),
        );
        let result = h.router.generate(&request(), false).await.unwrap();
        assert_eq!(result.provider.as_str(), FREE);

        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Succeed),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default().with_premium_rollout(false),
        );
        assert_eq!(h.router.select_provider(true).id().as_str(), FREE);
        let result = h.router.generate(&request(), true).await.unwrap();
        assert_eq!(result.provider.as_str(), FREE);
        assert_eq!(h.premium.generations(), 0);
    }

    #[tokio::test]
    async fn validation_rejection_never_reaches_any_generator() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Succeed),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default(),
        );
        let request = GenerationRequest::new("feet of a Teenager");
        let err = h.router.generate(&request, true).await.unwrap_err();

        match &err {
            RouterError::PolicyViolation {
                provider,
                matched_terms,
                ..
            } => {
                assert_eq!(provider.as_str(), PREMIUM);
                assert_eq!(matched_terms, &vec!["teen".to_string()]);
            }
            other => panic!("expected policy violation, got {other:?}"),
        }
        assert!(err.to_string().starts_with("Content policy violation:"));
        assert_eq!(h.premium.generations(), 0);
        assert_eq!(h.free.generations(), 0);

        let events = h.sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, TelemetryStatus::Error);
        assert_eq!(events[0].failure_type, Some(FailureType::Policy));
    }

    #[tokio::test]
    async fn provider_policy_error_does_not_fall_back() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Fail(GenerationError::policy("image flagged"))),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default(),
        );
        let err = h.router.generate(&request(), true).await.unwrap_err();

        assert_eq!(err.kind(), RouterErrorKind::Policy);
        assert_eq!(h.premium.generations(), 1);
        assert_eq!(h.free.generations(), 0);
        let events = h.sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].failure_type, Some(FailureType::Policy));
    }

    #[tokio::test]
    async fn policy_wording_in_message_is_classified_as_policy() {
        let h = harness(
            MockProvider::new(
                PREMIUM,
                Outcome::Fail(GenerationError::unknown("NSFW content detected in output")),
            ),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default(),
        );
        let err = h.router.generate(&request(), true).await.unwrap_err();
        assert!(err.is_policy_violation());
        assert_eq!(h.free.generations(), 0);
    }

    #[tokio::test]
    async fn technical_failure_falls_back_to_default() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Fail(GenerationError::server("503"))),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default(),
        );
        let result = h.router.generate(&request(), true).await.unwrap();

        assert_eq!(result.provider.as_str(), FREE);
        assert_eq!(h.premium.generations(), 1);
        assert_eq!(h.free.generations(), 1);
        assert_eq!(h.free.validations(), 0, "fallback skips re-validation by default");

        let events = h.sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].provider.as_str(), PREMIUM);
        assert_eq!(events[0].status, TelemetryStatus::Error);
        assert_eq!(events[0].failure_type, Some(FailureType::Technical));
        assert_eq!(events[1].provider.as_str(), FREE);
        assert_eq!(events[1].status, TelemetryStatus::Fallback);
        assert_eq!(events[0].request_id, events[1].request_id);
    }

    #[tokio::test]
    async fn non_retryable_technical_errors_still_fall_back() {
        let h = harness(
            MockProvider::new(
                PREMIUM,
                Outcome::Fail(GenerationError::authentication("missing credentials")),
            ),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default(),
        );
        let result = h.router.generate(&request(), true).await.unwrap();
        assert_eq!(result.provider.as_str(), FREE);
    }

    #[tokio::test]
    async fn access_denied_mentioning_iam_policy_falls_back() {
        let denied = bedrock::classify_service_error(
            Some("AccessDeniedException"),
            Some("User: arn:aws:iam::123456789012:user/ci is not authorized because no identity-based policy allows the bedrock:InvokeModel action"),
        );
        assert_eq!(denied.code, ErrorCode::Authentication);

        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Fail(denied)),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default(),
        );
        let result = h.router.generate(&request(), true).await.unwrap();

        assert_eq!(result.provider.as_str(), FREE);
        assert_eq!(h.free.generations(), 1);
        let events = h.sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].failure_type, Some(FailureType::Technical));
        assert_eq!(events[1].status, TelemetryStatus::Fallback);
    }

    #[tokio::test]
    async fn coded_technical_errors_ignore_policy_wording() {
        for error in [
            GenerationError::server("upstream safety service unavailable"),
            GenerationError::rate_limit("moderation quota exceeded"),
        ] {
            let h = harness(
                MockProvider::new(PREMIUM, Outcome::Fail(error)),
                MockProvider::new(FREE, Outcome::Succeed),
                RouterConfig::default(),
            );
            let result = h.router.generate(&request(), true).await.unwrap();
            assert_eq!(result.provider.as_str(), FREE);
        }
    }

    #[tokio::test]
    async fn unknown_error_with_neutral_wording_is_technical() {
        let h = harness(
            MockProvider::new(
                PREMIUM,
                Outcome::Fail(GenerationError::unknown("unexpected response shape")),
            ),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default(),
        );
        let result = h.router.generate(&request(), true).await.unwrap();

        assert_eq!(result.provider.as_str(), FREE);
        assert_eq!(h.premium.generations(), 1);
        assert_eq!(h.free.generations(), 1);
        let events = h.sink.events();
        assert_eq!(events[0].failure_type, Some(FailureType::Technical));
    }

    #[tokio::test]
    async fn request_metadata_reaches_every_event() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Fail(GenerationError::server("503"))),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default(),
        );
        let request = request().with_metadata("source", serde_json::json!("cli"));
        assert_eq!(describe_metadata(&request), r#"{"source":"cli"}"#);
        h.router.generate(&request, true).await.unwrap();

        let events = h.sink.events();
        assert_eq!(events.len(), 2);
        for event in &events {
            assert_eq!(event.metadata.get("source"), Some(&serde_json::json!("cli")));
        }
    }

    #[tokio::test]
    async fn failure_on_default_provider_has_no_fallback() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Succeed),
            MockProvider::new(FREE, Outcome::Fail(GenerationError::rate_limit("429"))),
            RouterConfig::default(),
        );
        let err = h.router.generate(&request(), false).await.unwrap_err();

        assert_eq!(err.kind(), RouterErrorKind::Technical);
        assert_eq!(err.to_string(), "Generation failed: rate_limit: 429");
        assert_eq!(h.free.generations(), 1);
        assert_eq!(h.premium.generations(), 0);
        let events = h.sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].failure_type, Some(FailureType::Technical));
    }

    #[tokio::test]
    async fn disabled_fallback_propagates_original_error() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Fail(GenerationError::server("boom"))),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default().with_fallback(false),
        );
        let err = h.router.generate(&request(), true).await.unwrap_err();

        assert!(err.to_string().contains("boom"));
        assert_eq!(h.free.generations(), 0);
        assert_eq!(h.sink.len(), 1);
    }

    #[tokio::test]
    async fn failed_fallback_surfaces_fallback_error_without_chaining() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Fail(GenerationError::server("premium down"))),
            MockProvider::new(FREE, Outcome::Fail(GenerationError::server("free down"))),
            RouterConfig::default(),
        );
        let err = h.router.generate(&request(), true).await.unwrap_err();

        assert!(err.to_string().contains("free down"));
        assert_eq!(h.premium.generations(), 1);
        assert_eq!(h.free.generations(), 1);
        let events = h.sink.events();
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| e.failure_type == Some(FailureType::Technical)));
        assert_eq!(events[1].provider.as_str(), FREE);
    }

    #[tokio::test]
    async fn slow_primary_times_out_and_falls_back() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Hang),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default().with_attempt_timeout(Duration::from_millis(20)),
        );
        let result = h.router.generate(&request(), true).await.unwrap();

        assert_eq!(result.provider.as_str(), FREE);
        let events = h.sink.events();
        assert!(events[0].error.as_deref().unwrap_or_default().starts_with("timeout"));
    }

    #[tokio::test]
    async fn validation_timeout_fails_closed() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Succeed).hanging_validation(),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default().with_attempt_timeout(Duration::from_millis(20)),
        );
        let err = h.router.generate(&request(), true).await.unwrap_err();

        assert_eq!(err.kind(), RouterErrorKind::Technical);
        assert_eq!(h.premium.generations(), 0);
        assert_eq!(h.free.generations(), 0);
        assert_eq!(h.sink.len(), 1);
    }

    #[tokio::test]
    async fn revalidation_on_fallback_applies_default_policy() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Fail(GenerationError::timeout("slow"))),
            MockProvider::new(FREE, Outcome::Succeed).forbidding(&["beach"]),
            RouterConfig::default().with_revalidate_on_fallback(true),
        );
        let err = h.router.generate(&request(), true).await.unwrap_err();

        assert!(err.is_policy_violation());
        assert_eq!(h.free.validations(), 1);
        assert_eq!(h.free.generations(), 0);
        let events = h.sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].failure_type, Some(FailureType::Technical));
        assert_eq!(events[1].failure_type, Some(FailureType::Policy));
        assert_eq!(events[1].provider.as_str(), FREE);
    }

    #[tokio::test]
    async fn concurrent_calls_are_independent() {
        let h = harness(
            MockProvider::new(PREMIUM, Outcome::Fail(GenerationError::server("flaky"))),
            MockProvider::new(FREE, Outcome::Succeed),
            RouterConfig::default(),
        );
        let req = request();
        let calls = (0..8).map(|i| h.router.generate(&req, i % 2 == 0));
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(h.premium.generations(), 4);
        assert_eq!(h.free.generations(), 8);
        // 4 premium failures + 4 fallbacks + 4 direct successes
        let events = h.sink.events();
        assert_eq!(events.len(), 12);
        let ids: HashSet<_> = events.iter().map(|e| e.request_id.clone()).collect();
        assert_eq!(ids.len(), 8);
    }
}

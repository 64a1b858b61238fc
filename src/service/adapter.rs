use crate::{
    assets::data_url::DataUrl,
    foundation::error::{ShelfError, ShelfResult},
    generate::{
        client::CellGenerator,
        request::{GenerateCameraBody, GenerationRequest, GenerationResult, Mode},
    },
    service::{
        capability::{ImageCapability, ImageEdit, OpenAiImageEdits, build_instruction},
        config::{AdapterConfig, TimeoutPolicy},
        fallback::fallback_result,
    },
};

type DynCapability = Box<dyn ImageCapability + Send + Sync>;

/// Server-side generation: validates requests and either calls the image capability or
/// serves the local fallback illustration.
pub struct Adapter {
    capability: Option<DynCapability>,
    timeout_policy: TimeoutPolicy,
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("online", &self.capability.is_some())
            .field("timeout_policy", &self.timeout_policy)
            .finish()
    }
}

impl Adapter {
    /// No capability: every valid request is answered in fallback mode.
    pub fn offline() -> Self {
        Self {
            capability: None,
            timeout_policy: TimeoutPolicy::Fail,
        }
    }

    pub fn with_capability(
        capability: impl ImageCapability + Send + Sync + 'static,
        timeout_policy: TimeoutPolicy,
    ) -> Self {
        Self {
            capability: Some(Box::new(capability)),
            timeout_policy,
        }
    }

    /// Online when `config` carries a credential, offline otherwise.
    pub fn from_config(config: &AdapterConfig) -> ShelfResult<Self> {
        let Some(key) = config.api_key.as_deref() else {
            return Ok(Self::offline());
        };
        let capability = OpenAiImageEdits::new(
            &config.endpoint,
            key,
            config.model.clone(),
            config.downstream_timeout,
        )?;
        tracing::info!(
            url = capability.url(),
            model = %config.model,
            timeout = ?config.downstream_timeout,
            "image capability configured"
        );
        Ok(Self::with_capability(capability, config.timeout_policy))
    }

    pub fn is_online(&self) -> bool {
        self.capability.is_some()
    }

    /// Validate a wire body, then generate.
    #[tracing::instrument(skip_all)]
    pub fn handle_body(&self, body: GenerateCameraBody) -> ShelfResult<GenerationResult> {
        let request = GenerationRequest::from_body(body)?;
        self.generate(&request)
    }

    #[tracing::instrument(
        skip_all,
        fields(
            subject = %request.subject_label,
            orientation = %request.orientation_label,
            width = request.target_width,
            height = request.target_height,
        )
    )]
    pub fn generate(&self, request: &GenerationRequest) -> ShelfResult<GenerationResult> {
        let Some(capability) = &self.capability else {
            return Ok(fallback_result(request));
        };

        let edit = ImageEdit::new(
            request.background.bytes().to_vec(),
            build_instruction(&request.subject_label, &request.orientation_label),
            request.target_width,
            request.target_height,
        );

        match capability.edit(&edit) {
            Ok(bytes) => Ok(GenerationResult {
                image: DataUrl::png(bytes),
                mode: Mode::Generated,
            }),
            Err(ShelfError::Timeout(msg)) if self.timeout_policy == TimeoutPolicy::Fallback => {
                tracing::warn!(%msg, "image capability timed out, serving fallback");
                Ok(fallback_result(request))
            }
            Err(err) => Err(err),
        }
    }
}

impl CellGenerator for Adapter {
    fn generate(&self, request: &GenerationRequest) -> ShelfResult<GenerationResult> {
        Adapter::generate(self, request)
    }
}

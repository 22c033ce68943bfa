//! Task orchestrator
//!
//! Owns the shared browser session for the run's lifetime. Every
//! interactive step goes through the retry executor wrapped around the
//! selector resolver; the one step automation cannot reliably finish
//! (sign-in) goes through the intervention coordinator instead.

use std::sync::Arc;
use std::time::Duration;

use browser_adapter::{AdapterError, Browser, ElementHandle};
use chrono::{SecondsFormat, Utc};
use csvpilot_core_types::TaskStatus;
use import_intervention::{InterventionCoordinator, InterventionRequest};
use import_locator::{SelectorResolver, SelectorSpec};
use import_retry::RetryPolicy;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::errors::{FlowError, StepError};
use crate::report::{RunSummary, TaskReport};
use crate::selectors::ImportSelectors;
use crate::task::{ImportTask, PipelineStage};

/// Credentials pre-filled into the sign-in form before handing off to
/// the operator. Pre-fill failure is a warning, never an error.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Timeouts and policies for one run. Immutable once the run starts.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub base_url: String,
    /// Budget for one selector resolution (split across candidates).
    pub selector_budget: Duration,
    /// Budget for the preview page's readiness indicator.
    pub validation_budget: Duration,
    /// Budget for the final completion indicator.
    pub completion_budget: Duration,
    /// Deadline passed to each navigation.
    pub navigation_deadline: Duration,
    /// Fixed pause between pipeline stages, letting the UI settle.
    pub settle_delay: Duration,
    pub retry_policy: RetryPolicy,
    /// Window granted to the operator for sign-in.
    pub auth_wait: Duration,
    pub auth_check_interval: Duration,
    /// Location substrings that indicate an authenticated session.
    pub authenticated_url_patterns: Vec<String>,
    pub credentials: Option<Credentials>,
}

impl OrchestratorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            selector_budget: Duration::from_secs(10),
            validation_budget: Duration::from_secs(15),
            completion_budget: Duration::from_secs(60),
            navigation_deadline: Duration::from_secs(10),
            settle_delay: Duration::from_millis(500),
            retry_policy: RetryPolicy::default(),
            auth_wait: Duration::from_secs(180),
            auth_check_interval: Duration::from_secs(2),
            authenticated_url_patterns: vec![
                "/dashboard".to_string(),
                "/home".to_string(),
                "/app".to_string(),
                "/portal".to_string(),
            ],
            credentials: None,
        }
    }

    fn import_url(&self) -> String {
        format!(
            "{}/dashboard/file-import",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// Sequences import tasks through the fixed five-stage pipeline.
pub struct TaskOrchestrator {
    browser: Arc<dyn Browser>,
    resolver: Arc<dyn SelectorResolver>,
    intervention: InterventionCoordinator,
    selectors: ImportSelectors,
    config: OrchestratorConfig,
    cancel: CancellationToken,
}

impl TaskOrchestrator {
    pub fn new(
        browser: Arc<dyn Browser>,
        resolver: Arc<dyn SelectorResolver>,
        selectors: ImportSelectors,
        config: OrchestratorConfig,
        cancel: CancellationToken,
    ) -> Self {
        let intervention = InterventionCoordinator::new(browser.clone(), cancel.clone());
        Self {
            browser,
            resolver,
            intervention,
            selectors,
            config,
            cancel,
        }
    }

    /// Authenticate once, before the task loop. Fatal for the whole run
    /// on failure; [`Self::run`] must not be entered without it.
    pub async fn authenticate(&self) -> Result<(), FlowError> {
        info!(url = %self.config.base_url, "navigating to sign-in");
        self.navigate_step(&self.config.base_url, "navigate to sign-in")
            .await?;

        if let Some(credentials) = self.config.credentials.clone() {
            if let Err(err) = self.prefill_credentials(&credentials).await {
                warn!(%err, "could not pre-fill credentials; enter them manually");
            } else {
                info!("credentials pre-filled");
            }
        }

        let request = InterventionRequest::new(
            "Complete the sign-in process manually in the browser window",
        )
        .with_window(self.config.auth_wait, self.config.auth_check_interval)
        .with_screenshot_label("authentication");

        let browser = self.browser.clone();
        let patterns = self.config.authenticated_url_patterns.clone();
        self.intervention
            .await_manual_completion(&request, move || {
                let browser = browser.clone();
                let patterns = patterns.clone();
                async move {
                    let url = browser.current_location().await?;
                    Ok::<_, AdapterError>(patterns.iter().any(|p| url.contains(p.as_str())))
                }
            })
            .await?;

        info!("authentication satisfied");
        Ok(())
    }

    /// Drive every task through the pipeline, isolating failures.
    ///
    /// Consumes the task list: tasks are owned by the orchestrator and
    /// their statuses advance monotonically as the pipeline progresses.
    pub async fn run(&self, mut tasks: Vec<ImportTask>) -> RunSummary {
        let mut summary = RunSummary::default();
        let total = tasks.len();

        for (index, task) in tasks.iter_mut().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(
                    remaining = total - index,
                    "stop signal observed; leaving remaining tasks pending"
                );
                break;
            }

            info!(
                task = index + 1,
                total,
                import_type = %task.import_type,
                file = %task.file_path.display(),
                "starting import task"
            );
            Self::mark(task, TaskStatus::Running);

            match self.execute_task(index, task).await {
                Ok(()) => {
                    Self::mark(task, TaskStatus::Completed);
                    info!(task = index + 1, import_type = %task.import_type, "import completed");
                    summary.push(TaskReport::completed(
                        task.import_type,
                        task.file_path.clone(),
                        task.validation.data_rows(),
                    ));
                }
                Err(err) => {
                    Self::mark(task, TaskStatus::Failed);
                    error!(
                        task = index + 1,
                        import_type = %task.import_type,
                        %err,
                        "import failed; continuing with next task"
                    );
                    self.capture(&format!("error-import-{}-{}", index + 1, task.import_type))
                        .await;
                    summary.push(TaskReport::failed(
                        task.import_type,
                        task.file_path.clone(),
                        task.validation.data_rows(),
                        err.to_string(),
                    ));
                }
            }
        }

        info!(
            completed = summary.completed,
            failed = summary.failed,
            "task loop finished"
        );
        summary
    }

    async fn execute_task(&self, index: usize, task: &ImportTask) -> Result<(), FlowError> {
        let prefix = format!("{:02}-{}", index + 1, task.import_type);

        for stage in [
            PipelineStage::LocateAndSelectTarget,
            PipelineStage::SubmitInput,
            PipelineStage::VerifyReadiness,
            PipelineStage::Confirm,
            PipelineStage::AwaitCompletion,
        ] {
            if self.cancel.is_cancelled() {
                return Err(FlowError::Cancelled(stage.label().to_string()));
            }

            info!(stage = %stage, task = %prefix, "entering stage");
            match stage {
                PipelineStage::LocateAndSelectTarget => {
                    self.locate_and_select_target(task).await?
                }
                PipelineStage::SubmitInput => self.submit_input(task).await?,
                PipelineStage::VerifyReadiness => self.verify_readiness().await?,
                PipelineStage::Confirm => self.confirm().await?,
                PipelineStage::AwaitCompletion => self.await_completion().await?,
            }

            self.capture(&format!("{prefix}-{stage}")).await;
            sleep(self.config.settle_delay).await;
        }

        Ok(())
    }

    /// Stage 1: open the import surface and pick the file type.
    async fn locate_and_select_target(&self, task: &ImportTask) -> Result<(), FlowError> {
        self.navigate_step(&self.config.import_url(), "navigate to import")
            .await?;
        self.click_step(&self.selectors.import_button).await?;
        self.resolve_step(&self.selectors.file_type_modal, self.config.selector_budget, true)
            .await?;
        let radio = self.selectors.type_radio(task.import_type);
        self.click_step(&radio).await?;
        self.click_step(&self.selectors.next_button).await?;
        Ok(())
    }

    /// Stage 2: hand the file to the upload control and move on.
    async fn submit_input(&self, task: &ImportTask) -> Result<(), FlowError> {
        self.resolve_step(&self.selectors.drop_zone, self.config.selector_budget, true)
            .await?;
        // File inputs are routinely hidden behind styled drop zones.
        let path = task.file_path.display().to_string();
        self.type_step(&self.selectors.file_input, &path, false)
            .await?;
        self.resolve_step(&self.selectors.remove_file, self.config.selector_budget, true)
            .await?;
        self.click_step(&self.selectors.next_button).await?;
        Ok(())
    }

    /// Stage 3: the preview must declare the data ready.
    ///
    /// Single-shot: the budget is the wait, retrying would not make
    /// invalid data valid.
    async fn verify_readiness(&self) -> Result<(), FlowError> {
        self.resolver
            .resolve(
                &self.selectors.validation_success,
                self.config.validation_budget,
                true,
            )
            .await?;
        self.click_step(&self.selectors.next_button).await?;
        Ok(())
    }

    /// Stage 4: final confirmation.
    async fn confirm(&self) -> Result<(), FlowError> {
        self.resolve_step(&self.selectors.ready_to_import, self.config.selector_budget, true)
            .await?;
        self.click_step(&self.selectors.import_file_button).await?;
        Ok(())
    }

    /// Stage 5: wait out the import itself.
    async fn await_completion(&self) -> Result<(), FlowError> {
        self.resolver
            .resolve(
                &self.selectors.completion_indicator,
                self.config.completion_budget,
                false,
            )
            .await?;
        Ok(())
    }

    async fn prefill_credentials(&self, credentials: &Credentials) -> Result<(), FlowError> {
        self.type_step(&self.selectors.email_input, &credentials.username, true)
            .await?;
        self.type_step(&self.selectors.password_input, &credentials.password, true)
            .await?;
        Ok(())
    }

    async fn navigate_step(&self, url: &str, label: &str) -> Result<(), FlowError> {
        import_retry::execute(
            || async {
                self.browser
                    .navigate(url, self.config.navigation_deadline)
                    .await
                    .map_err(StepError::from)
            },
            &self.config.retry_policy,
            label,
        )
        .await
        .into_result()
        .map_err(FlowError::from)
    }

    async fn resolve_step(
        &self,
        spec: &SelectorSpec,
        budget: Duration,
        visibility_required: bool,
    ) -> Result<ElementHandle, FlowError> {
        import_retry::execute(
            || async {
                self.resolver
                    .resolve(spec, budget, visibility_required)
                    .await
                    .map_err(StepError::from)
            },
            &self.config.retry_policy,
            &spec.target,
        )
        .await
        .into_result()
        .map_err(FlowError::from)
    }

    async fn click_step(&self, spec: &SelectorSpec) -> Result<(), FlowError> {
        import_retry::execute(
            || async {
                let handle = self
                    .resolver
                    .resolve(spec, self.config.selector_budget, true)
                    .await
                    .map_err(StepError::from)?;
                self.browser.click(&handle).await.map_err(StepError::from)
            },
            &self.config.retry_policy,
            &spec.target,
        )
        .await
        .into_result()
        .map_err(FlowError::from)
    }

    async fn type_step(
        &self,
        spec: &SelectorSpec,
        text: &str,
        visibility_required: bool,
    ) -> Result<(), FlowError> {
        import_retry::execute(
            || async {
                let handle = self
                    .resolver
                    .resolve(spec, self.config.selector_budget, visibility_required)
                    .await
                    .map_err(StepError::from)?;
                self.browser
                    .type_text(&handle, text)
                    .await
                    .map_err(StepError::from)
            },
            &self.config.retry_policy,
            &spec.target,
        )
        .await
        .into_result()
        .map_err(FlowError::from)
    }

    /// Diagnostic screenshot; failure never affects the pipeline.
    async fn capture(&self, label: &str) {
        let stamp = Utc::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        let name = format!("{label}-{stamp}");
        if let Err(err) = self.browser.capture_image(&name).await {
            warn!(label = name, %err, "screenshot failed");
        }
    }

    fn mark(task: &mut ImportTask, status: TaskStatus) {
        if let Err(err) = task.advance(status) {
            // Transitions are driven only from this file; reaching this
            // means a bug, not a recoverable condition.
            error!(%err, "refused task status change");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_adapter::{StubBrowser, StubElement, StubPage};
    use csv_contract::CsvValidationResult;
    use csvpilot_core_types::ImportType;
    use import_locator::DefaultSelectorResolver;
    use std::path::PathBuf;

    // Host chosen so no authenticated-URL pattern matches before the
    // operator signs in.
    const BASE: &str = "https://imports.test";

    fn test_selectors() -> ImportSelectors {
        ImportSelectors {
            email_input: SelectorSpec::new("email input").css("input[name=email]"),
            password_input: SelectorSpec::new("password input").css("input[type=password]"),
            import_button: SelectorSpec::new("import button").text("Import"),
            file_type_modal: SelectorSpec::new("file type modal").text("Select the file type"),
            next_button: SelectorSpec::new("next button").text("Next"),
            drop_zone: SelectorSpec::new("drop zone").text("Drop or select file"),
            file_input: SelectorSpec::new("file input").css("input[type=file]"),
            remove_file: SelectorSpec::new("remove file").text("Remove file"),
            validation_success: SelectorSpec::new("validation success")
                .text("All data is valid and ready to import"),
            ready_to_import: SelectorSpec::new("ready to import").text("Ready to import"),
            import_file_button: SelectorSpec::new("import file button").text("Import File"),
            completion_indicator: SelectorSpec::new("completion indicator").text("completed"),
        }
    }

    fn test_config() -> OrchestratorConfig {
        let mut config = OrchestratorConfig::new(BASE);
        config.selector_budget = Duration::from_millis(60);
        config.validation_budget = Duration::from_millis(40);
        config.completion_budget = Duration::from_millis(60);
        config.navigation_deadline = Duration::from_millis(50);
        config.settle_delay = Duration::from_millis(1);
        config.retry_policy = RetryPolicy::new(2, Duration::from_millis(1));
        config.auth_wait = Duration::from_millis(400);
        config.auth_check_interval = Duration::from_millis(5);
        config
    }

    fn task_for(import_type: ImportType) -> ImportTask {
        ImportTask::new(
            import_type,
            CsvValidationResult {
                path: PathBuf::from(format!("data/{import_type}-template.csv")),
                byte_size: 128,
                line_count: 4,
                headers: vec!["name".into(), "code".into()],
            },
        )
    }

    /// Full import wizard graph. `broken_preview` types get a preview
    /// page without the readiness indicator.
    fn install_wizard(stub: &StubBrowser, selectors: &ImportSelectors, broken_preview: &[ImportType]) {
        let text = |s: &SelectorSpec| s.candidates[0].clone();

        stub.add_route(format!("{BASE}/dashboard/file-import"), "import-history");
        stub.install_page(
            "import-history",
            StubPage::new().with_element(
                text(&selectors.import_button),
                StubElement::visible().leads_to("modal"),
            ),
        );

        let mut modal = StubPage::new()
            .with_element(text(&selectors.file_type_modal), StubElement::visible());
        for ty in ImportType::all() {
            let radio = selectors.type_radio(ty).candidates[0].clone();
            modal = modal.with_element(
                radio,
                StubElement::visible().leads_to(format!("modal-{ty}")),
            );
        }
        stub.install_page("modal", modal);

        for ty in ImportType::all() {
            stub.install_page(
                format!("modal-{ty}"),
                StubPage::new()
                    .with_element(text(&selectors.file_type_modal), StubElement::visible())
                    .with_element(
                        text(&selectors.next_button),
                        StubElement::visible().leads_to(format!("upload-{ty}")),
                    ),
            );

            stub.install_page(
                format!("upload-{ty}"),
                StubPage::new()
                    .with_element(text(&selectors.drop_zone), StubElement::visible())
                    .with_element(text(&selectors.file_input), StubElement::hidden())
                    .with_element(text(&selectors.remove_file), StubElement::visible())
                    .with_element(
                        text(&selectors.next_button),
                        StubElement::visible().leads_to(format!("preview-{ty}")),
                    ),
            );

            let mut preview = StubPage::new().with_element(
                text(&selectors.next_button),
                StubElement::visible().leads_to(format!("confirm-{ty}")),
            );
            if !broken_preview.contains(&ty) {
                preview = preview
                    .with_element(text(&selectors.validation_success), StubElement::visible());
            }
            stub.install_page(format!("preview-{ty}"), preview);

            stub.install_page(
                format!("confirm-{ty}"),
                StubPage::new()
                    .with_element(text(&selectors.ready_to_import), StubElement::visible())
                    .with_element(
                        text(&selectors.import_file_button),
                        StubElement::visible().leads_to(format!("done-{ty}")),
                    ),
            );

            stub.install_page(
                format!("done-{ty}"),
                StubPage::new()
                    .with_element(text(&selectors.completion_indicator), StubElement::visible()),
            );
        }
    }

    fn orchestrator(
        stub: Arc<StubBrowser>,
        config: OrchestratorConfig,
        cancel: CancellationToken,
    ) -> TaskOrchestrator {
        let resolver = Arc::new(
            DefaultSelectorResolver::new(stub.clone())
                .with_poll_interval(Duration::from_millis(2)),
        );
        TaskOrchestrator::new(stub, resolver, test_selectors(), config, cancel)
    }

    #[tokio::test]
    async fn a_failing_task_does_not_disturb_its_neighbors() {
        let stub = Arc::new(StubBrowser::new());
        let selectors = test_selectors();
        install_wizard(&stub, &selectors, &[ImportType::Projects]);

        let orchestrator = orchestrator(stub.clone(), test_config(), CancellationToken::new());
        let tasks = vec![
            task_for(ImportType::Schemes),
            task_for(ImportType::Projects),
            task_for(ImportType::Inspectors),
        ];

        let summary = orchestrator.run(tasks).await;

        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.reports[0].status, TaskStatus::Completed);
        assert_eq!(summary.reports[1].status, TaskStatus::Failed);
        assert_eq!(summary.reports[2].status, TaskStatus::Completed);
        assert_eq!(summary.reports[0].expected, 3);
        assert_eq!(summary.reports[0].found, 3);
        assert_eq!(summary.reports[1].found, 0);
        assert!(!summary.reports[1].issues.is_empty());

        // The failed task leaves a labeled diagnostic capture behind.
        assert!(stub
            .capture_labels()
            .iter()
            .any(|l| l.starts_with("error-import-2-projects")));

        // The upload stage typed each surviving task's file path.
        let typed = stub.typed_text();
        assert!(typed.iter().any(|t| t.contains("schemes")));
        assert!(typed.iter().any(|t| t.contains("inspectors")));
    }

    #[tokio::test]
    async fn happy_path_completes_every_task() {
        let stub = Arc::new(StubBrowser::new());
        let selectors = test_selectors();
        install_wizard(&stub, &selectors, &[]);

        let orchestrator = orchestrator(stub.clone(), test_config(), CancellationToken::new());
        let summary = orchestrator
            .run(vec![task_for(ImportType::Schemes), task_for(ImportType::Projects)])
            .await;

        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 0);
        // Stage captures carry the task prefix and stage label.
        assert!(stub
            .capture_labels()
            .iter()
            .any(|l| l.starts_with("01-schemes-locate-and-select-target")));
        assert!(stub
            .capture_labels()
            .iter()
            .any(|l| l.starts_with("02-projects-await-completion")));
    }

    #[tokio::test]
    async fn authentication_prefills_and_waits_for_the_operator() {
        let stub = Arc::new(StubBrowser::new());
        let selectors = test_selectors();
        stub.add_route(BASE.to_string(), "login");
        stub.install_page(
            "login",
            StubPage::new()
                .with_element(selectors.email_input.candidates[0].clone(), StubElement::visible())
                .with_element(
                    selectors.password_input.candidates[0].clone(),
                    StubElement::visible(),
                ),
        );

        let mut config = test_config();
        config.credentials = Some(Credentials {
            username: "user@example.com".into(),
            password: "hunter2".into(),
        });
        let orchestrator = orchestrator(stub.clone(), config, CancellationToken::new());

        // The "operator" signs in after a short delay.
        let operator = tokio::spawn({
            let stub = stub.clone();
            async move {
                sleep(Duration::from_millis(40)).await;
                stub.set_location(format!("{BASE}/dashboard"));
            }
        });

        orchestrator.authenticate().await.unwrap();
        operator.await.unwrap();

        let typed = stub.typed_text();
        assert!(typed.contains(&"user@example.com".to_string()));
        assert!(typed.contains(&"hunter2".to_string()));
    }

    #[tokio::test]
    async fn authentication_timeout_is_fatal() {
        let stub = Arc::new(StubBrowser::new());
        stub.add_route(BASE.to_string(), "login");
        stub.install_page("login", StubPage::new());

        let orchestrator = orchestrator(stub, test_config(), CancellationToken::new());
        let err = orchestrator.authenticate().await.unwrap_err();
        assert!(matches!(err, FlowError::Intervention(_)));
    }

    #[tokio::test]
    async fn cancelled_run_leaves_tasks_untouched() {
        let stub = Arc::new(StubBrowser::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let orchestrator = orchestrator(stub, test_config(), cancel);
        let summary = orchestrator.run(vec![task_for(ImportType::Schemes)]).await;

        assert_eq!(summary.total(), 0);
    }
}

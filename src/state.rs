use tracing::warn;

use crate::analyzer::{Analysis, AnalysisRequest, Analyzer, InputError, InputMode};
use crate::dataset;
use crate::gemini::ImagePayload;
use crate::models::DemoDatasetItem;

/// Per-session state handed to command handlers.
#[derive(Debug, Default)]
pub struct AppState {
    pub input_text: String,
    pub image: Option<ImagePayload>,
    pub mode: InputMode,
    pub is_analyzing: bool,
    pub result: Option<Analysis>,
    pub demo_mode: bool,
    pub selected_scenario: Option<&'static str>,
}

impl AppState {
    pub fn new(demo_mode: bool) -> Self {
        Self {
            demo_mode,
            ..Self::default()
        }
    }

    /// Replaces the input text; a stale verdict no longer applies.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input_text = text.into();
        self.selected_scenario = None;
        self.result = None;
    }

    pub fn set_image(&mut self, image: Option<ImagePayload>) {
        self.image = image;
        self.result = None;
    }

    /// History label for the current input.
    pub fn mode_label(&self) -> &'static str {
        if self.selected_scenario.is_some() {
            "demo"
        } else {
            self.mode.as_str()
        }
    }

    /// Loads a demo scenario as the current input.
    pub fn fill_demo_data(&mut self, id: &str) -> Result<&'static DemoDatasetItem, InputError> {
        let item = dataset::find_by_id(id)
            .ok_or_else(|| InputError::UnknownScenario(id.to_string()))?;
        self.set_input(item.text);
        self.image = None;
        self.selected_scenario = Some(item.id);
        Ok(item)
    }

    pub fn request(&self) -> Result<AnalysisRequest, InputError> {
        AnalysisRequest::new(self.input_text.clone(), self.image.clone())
    }

    pub fn begin_analysis(&mut self) {
        self.is_analyzing = true;
        self.result = None;
    }

    pub fn finish_analysis(&mut self, analysis: Analysis) -> &Analysis {
        self.is_analyzing = false;
        self.result.insert(analysis)
    }

    /// Validates the current input and runs it through the analyzer.
    pub async fn run(&mut self, analyzer: &Analyzer) -> Result<&Analysis, InputError> {
        let request = self.request()?;
        Ok(self.submit(analyzer, request).await)
    }

    /// Runs an already validated request, e.g. a composed email.
    pub async fn submit(&mut self, analyzer: &Analyzer, request: AnalysisRequest) -> &Analysis {
        if self.is_analyzing {
            warn!("previous analysis never finished; starting a new one");
        }
        self.input_text.clone_from(&request.text);
        self.mode = request.mode;
        self.begin_analysis();
        let analysis = analyzer.analyze(&request).await;
        self.finish_analysis(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Route;
    use crate::models::RiskLevel;

    #[test]
    fn demo_scenario_fills_the_input() {
        let mut state = AppState::new(true);
        let item = state.fill_demo_data("otp-share").unwrap();

        assert_eq!(state.input_text, item.text);
        assert_eq!(state.selected_scenario, Some("otp-share"));
        assert!(state.demo_mode);
    }

    #[test]
    fn unknown_scenario_leaves_state_untouched() {
        let mut state = AppState::new(false);
        state.set_input("hello");
        let err = state.fill_demo_data("nope").unwrap_err();

        assert_eq!(err, InputError::UnknownScenario("nope".to_string()));
        assert_eq!(state.input_text, "hello");
    }

    #[test]
    fn editing_input_clears_scenario_and_result() {
        let mut state = AppState::new(false);
        state.fill_demo_data("lottery").unwrap();
        state.set_input("something else");
        assert!(state.selected_scenario.is_none());
        assert!(state.result.is_none());
    }

    #[test]
    fn empty_input_is_rejected_before_analysis() {
        let state = AppState::new(false);
        assert_eq!(state.request().unwrap_err(), InputError::Empty);
    }

    #[tokio::test]
    async fn run_stores_the_verdict() {
        let mut state = AppState::new(true);
        state.fill_demo_data("bank-kyc").unwrap();

        let analysis = state.run(&Analyzer::offline()).await.unwrap();
        assert_eq!(analysis.route, Route::Heuristic);
        assert_eq!(analysis.response.risk_level, RiskLevel::Critical);
        assert!(!state.is_analyzing);
        assert!(state.result.is_some());
        assert_eq!(state.mode_label(), "demo");
    }

    #[tokio::test]
    async fn submitted_email_becomes_the_input() {
        let mut state = AppState::new(true);
        let request =
            AnalysisRequest::email("kyc@sbi-verify.xyz", "Account blocked", "Update KYC now")
                .unwrap();

        let analysis = state.submit(&Analyzer::offline(), request).await;
        assert!(analysis.response.email_analysis.is_email);
        assert!(state.input_text.starts_with("[EMAIL_HEADER_ANALYSIS_REQUEST]"));
        assert_eq!(state.mode_label(), "email");
    }

    #[tokio::test]
    async fn run_without_input_keeps_the_flag_clear() {
        let mut state = AppState::new(true);
        let err = state.run(&Analyzer::offline()).await.unwrap_err();
        assert_eq!(err, InputError::Empty);
        assert!(!state.is_analyzing);
    }
}

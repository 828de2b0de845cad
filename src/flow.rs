//! The branch-finder navigation sequence.
//!
//! Eight steps in a fixed order: load the page, clear the cookie banner and
//! the welcome modal, wait for the modal to actually leave the DOM, open the
//! agency finder, run a search, pick the configured branch, and verify the
//! destination page. The ordering is load-bearing: the agency link does not
//! accept clicks while the modal overlay is still animating out.
//!
//! Steps differ in how their failure is treated. The two overlays are
//! optional page states, so their absence is recorded and skipped. The
//! finder steps soft-fail: a screenshot is captured, the failure is counted,
//! and the sequence keeps going, because later steps often still work and
//! tell us more about what the page looks like. Selection and verification
//! are the point of the whole run and abort it on failure.

use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::RunConfig;
use crate::diagnostics::DiagnosticsCollector;
use crate::errors::MonitorError;
use crate::session::{PageElement, PageSession, Target};
use crate::wait::WaitGate;

/// Locators for the monitored page, as the bank ships it today.
mod selectors {
    pub const COOKIE_ACCEPT: &str = "//button[contains(text(), 'Tout accepter')]";
    pub const MODAL_CLOSE: &str = ".js-close-dialog";
    pub const MODAL_CONTAINER: &str = ".bpce-modal-animate-container";
    pub const FIND_AGENCY_LINK: &str = "Trouver une agence";
    pub const CITY_FIELD: &str = ".font-text-body-bold";
    pub const POSTCODE_FIELD: &str = "em-searchcity";
    pub const POSTCODE_FIELD_ALT: &str = "input[placeholder='Ville / Code postal']";
    pub const SEARCH_BUTTON: &str = "//button[contains(text(), 'Rechercher')]";
}

const CAPTURE_FIND_AGENCY: &str = "error_find_agency";
const CAPTURE_FORM_FIELDS: &str = "error_form_fields";

/// One step of the navigation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Access,
    DismissCookieBanner,
    CloseModal,
    AwaitModalGone,
    ClickFindAgency,
    FillSearchForm,
    SelectLocation,
    VerifyLocation,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Access => "access",
            Step::DismissCookieBanner => "dismiss cookie banner",
            Step::CloseModal => "close modal",
            Step::AwaitModalGone => "await modal gone",
            Step::ClickFindAgency => "click find agency",
            Step::FillSearchForm => "fill search form",
            Step::SelectLocation => "select location",
            Step::VerifyLocation => "verify location",
        }
    }
}

/// What one step produced. An optional overlay that never showed up is an
/// expected page state and is kept distinct from a failure.
#[derive(Debug)]
pub enum StepOutcome {
    Success,
    SkippedExpected(&'static str),
    Failed(MonitorError),
}

/// Wait bounds for the individual steps.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// Lookup window for the cookie consent button
    pub cookie_banner: Duration,
    /// Lookup window for the welcome modal close button
    pub modal_close: Duration,
    /// How long the modal container may take to leave the DOM
    pub modal_gone: Duration,
    /// Window for finder links, form fields and buttons
    pub interaction: Duration,
    /// Stability buffer around animation-prone interactions; a plain
    /// bounded sleep, deliberately not a condition
    pub settle: Duration,
    /// Pause between condition polls
    pub poll: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            cookie_banner: Duration::from_secs(5),
            modal_close: Duration::from_secs(5),
            modal_gone: Duration::from_secs(10),
            interaction: Duration::from_secs(10),
            settle: Duration::from_secs(2),
            poll: Duration::from_millis(250),
        }
    }
}

/// Drives the fixed navigation sequence against one borrowed session.
pub struct BranchFinderFlow<'a, S: PageSession> {
    session: &'a S,
    diagnostics: &'a DiagnosticsCollector,
    config: &'a RunConfig,
    timings: Timings,
    wait: WaitGate,
    outcomes: Vec<(Step, StepOutcome)>,
}

impl<'a, S: PageSession> BranchFinderFlow<'a, S> {
    pub fn new(
        session: &'a S,
        diagnostics: &'a DiagnosticsCollector,
        config: &'a RunConfig,
    ) -> Self {
        Self::with_timings(session, diagnostics, config, Timings::default())
    }

    pub fn with_timings(
        session: &'a S,
        diagnostics: &'a DiagnosticsCollector,
        config: &'a RunConfig,
        timings: Timings,
    ) -> Self {
        BranchFinderFlow {
            session,
            diagnostics,
            config,
            timings,
            wait: WaitGate::new(timings.poll),
            outcomes: Vec::new(),
        }
    }

    /// Run all steps in order. `Ok` means the sequence reached verification
    /// and the destination page checked out; the returned error is the hard
    /// failure that aborted the sequence. Soft failures do not abort and are
    /// visible through [`soft_failures`](Self::soft_failures).
    pub async fn run(&mut self) -> Result<(), MonitorError> {
        self.access().await?;
        self.dismiss_cookie_banner().await?;
        self.close_modal().await?;
        self.await_modal_gone().await;
        self.click_find_agency().await;
        self.fill_search_form().await;
        self.select_location().await?;
        self.verify_location().await?;
        Ok(())
    }

    /// Step-by-step record of everything that ran so far.
    pub fn outcomes(&self) -> &[(Step, StepOutcome)] {
        &self.outcomes
    }

    /// Number of steps that failed without aborting the sequence.
    pub fn soft_failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, StepOutcome::Failed(_)))
            .count()
    }

    async fn access(&mut self) -> Result<(), MonitorError> {
        self.session.navigate(&self.config.website_url).await?;
        info!("Page loaded");
        self.record(Step::Access, StepOutcome::Success);
        Ok(())
    }

    /// Cookie consent comes and goes with campaigns and prior visits; a page
    /// without the banner is healthy. A banner that is there but refuses the
    /// click is not, and aborts the run.
    async fn dismiss_cookie_banner(&mut self) -> Result<(), MonitorError> {
        let target = Target::xpath(selectors::COOKIE_ACCEPT);
        match self
            .wait
            .present(self.session, &target, self.timings.cookie_banner)
            .await
        {
            Ok(button) => {
                button.click().await?;
                info!("Accepted the cookie banner");
                self.record(Step::DismissCookieBanner, StepOutcome::Success);
            }
            Err(err) if err.is_absence() => {
                info!("Cookie banner not found, continuing");
                self.record(
                    Step::DismissCookieBanner,
                    StepOutcome::SkippedExpected("cookie banner not present"),
                );
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    async fn close_modal(&mut self) -> Result<(), MonitorError> {
        let target = Target::css(selectors::MODAL_CLOSE);
        match self
            .wait
            .clickable(self.session, &target, self.timings.modal_close)
            .await
        {
            Ok(button) => {
                button.click().await?;
                info!("Closed the welcome modal");
                self.record(Step::CloseModal, StepOutcome::Success);
            }
            Err(err) if err.is_absence() => {
                info!("No welcome modal to close, continuing");
                self.record(
                    Step::CloseModal,
                    StepOutcome::SkippedExpected("welcome modal not present"),
                );
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    /// The modal animates out after closing; the agency link does not take
    /// clicks reliably until its container has left the DOM. A container
    /// that was never there satisfies the condition immediately.
    async fn await_modal_gone(&mut self) {
        let target = Target::css(selectors::MODAL_CONTAINER);
        match self
            .wait
            .gone(self.session, &target, self.timings.modal_gone)
            .await
        {
            Ok(()) => {
                info!("Modal overlay is gone");
                self.record(Step::AwaitModalGone, StepOutcome::Success);
            }
            Err(err) => {
                self.soft_fail(Step::AwaitModalGone, CAPTURE_FIND_AGENCY, err)
                    .await
            }
        }
    }

    async fn click_find_agency(&mut self) {
        match self.try_click_find_agency().await {
            Ok(()) => self.record(Step::ClickFindAgency, StepOutcome::Success),
            Err(err) => {
                self.soft_fail(Step::ClickFindAgency, CAPTURE_FIND_AGENCY, err)
                    .await
            }
        }
    }

    async fn try_click_find_agency(&self) -> Result<(), MonitorError> {
        let target = Target::link_text(selectors::FIND_AGENCY_LINK);
        let link = self
            .wait
            .present(self.session, &target, self.timings.interaction)
            .await?;
        self.session.scroll_into_view(&link).await?;

        let displayed = link.is_displayed().await?;
        let enabled = link.is_enabled().await?;
        info!("Agency link displayed: {}, enabled: {}", displayed, enabled);
        if !displayed || !enabled {
            return Err(MonitorError::ElementNotFound(format!(
                "{} is present but not interactable",
                target
            )));
        }

        self.wait
            .clickable(self.session, &target, self.timings.interaction)
            .await?;
        self.settle().await;
        link.click().await?;
        info!("Clicked the agency finder link");
        Ok(())
    }

    async fn fill_search_form(&mut self) {
        match self.try_fill_search_form().await {
            Ok(()) => self.record(Step::FillSearchForm, StepOutcome::Success),
            Err(err) => {
                self.soft_fail(Step::FillSearchForm, CAPTURE_FORM_FIELDS, err)
                    .await
            }
        }
    }

    async fn try_fill_search_form(&self) -> Result<(), MonitorError> {
        let search = &self.config.search;

        let city_field = self
            .wait
            .present(
                self.session,
                &Target::css(selectors::CITY_FIELD),
                self.timings.interaction,
            )
            .await?;
        city_field.send_keys(&search.city).await?;
        info!("Entered city '{}'", search.city);

        // The postcode field has gone through two markups; try both
        let postcode_chain = [
            Target::id(selectors::POSTCODE_FIELD),
            Target::css(selectors::POSTCODE_FIELD_ALT),
        ];
        let postcode_field = self
            .wait
            .first_present(self.session, &postcode_chain, self.timings.interaction)
            .await?;
        postcode_field.send_keys(&search.postcode).await?;
        info!("Entered postcode '{}'", search.postcode);

        let search_button = self
            .wait
            .clickable(
                self.session,
                &Target::xpath(selectors::SEARCH_BUTTON),
                self.timings.interaction,
            )
            .await?;
        search_button.click().await?;
        info!("Submitted the branch search");
        Ok(())
    }

    /// Picking the wrong branch would make verification meaningless, so a
    /// missing result link aborts the run.
    async fn select_location(&mut self) -> Result<(), MonitorError> {
        let target = Target::link_text(&self.config.location);
        let link = self
            .wait
            .present(self.session, &target, self.timings.interaction)
            .await?;
        link.click().await?;
        info!("Selected location '{}'", self.config.location);
        self.record(Step::SelectLocation, StepOutcome::Success);
        Ok(())
    }

    /// The pass/fail signal of the whole run: the destination page must
    /// mention the branch we asked for.
    async fn verify_location(&mut self) -> Result<(), MonitorError> {
        self.settle().await;
        let marker = location_marker(&self.config.location);
        let source = self.session.page_source().await?;
        if !source.contains(marker) {
            return Err(MonitorError::Verification(format!(
                "page for '{}' does not mention '{}'",
                self.config.location, marker
            )));
        }
        info!("Verified the page for '{}'", self.config.location);
        self.record(Step::VerifyLocation, StepOutcome::Success);
        Ok(())
    }

    async fn soft_fail(&mut self, step: Step, capture: &str, err: MonitorError) {
        error!("Step '{}' failed: {}", step.name(), err);
        self.diagnostics.capture(self.session, capture).await;
        self.record(step, StepOutcome::Failed(err));
    }

    fn record(&mut self, step: Step, outcome: StepOutcome) {
        debug!("Step '{}' -> {:?}", step.name(), outcome);
        self.outcomes.push((step, outcome));
    }

    async fn settle(&self) {
        tokio::time::sleep(self.timings.settle).await;
    }
}

/// The substring the destination page must contain: the most specific part
/// of the configured location name ("Lyon Perrache" gives "Perrache").
fn location_marker(location: &str) -> &str {
    location.split_whitespace().last().unwrap_or(location)
}

#[cfg(test)]
#[path = "flow_test.rs"]
mod flow_test;

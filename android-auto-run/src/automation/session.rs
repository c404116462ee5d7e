// Visual wait loops for a single device
//
// Every operation captures the screen, scores templates in order and decides
// whether to stop, continue or fail. The most recent match is remembered per
// session so later steps can branch on what was seen.

use super::config::WaitConfig;
use super::error::{AutomationError, AutomationResult};
use super::frequency::FrequencyLimiter;
use crate::adb::AdbClient;
use crate::geometry::Point;
use crate::match_image::{Bitmap, MatchEngine, MatchResult, Template};
use std::time::Duration;
use tokio::time::Instant;

/// A decoded screen capture and how long the device took to deliver it
struct Frame {
    image: Bitmap,
    capture_ms: u128,
}

pub struct DeviceSession<D: AdbClient> {
    device: D,
    engine: MatchEngine,
    wait: WaitConfig,
    last_match: Option<Template>,
}

impl<D: AdbClient> DeviceSession<D> {
    pub fn new(device: D) -> Self {
        Self::with_config(device, MatchEngine::default(), WaitConfig::default())
    }

    pub fn with_config(device: D, engine: MatchEngine, wait: WaitConfig) -> Self {
        Self {
            device,
            engine,
            wait,
            last_match: None,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn wait_config(&self) -> &WaitConfig {
        &self.wait
    }

    pub fn last_match(&self) -> Option<&Template> {
        self.last_match.as_ref()
    }

    pub fn into_device(self) -> D {
        self.device
    }

    async fn capture(&self) -> Option<Frame> {
        match self.device.screen_capture().await {
            Ok(capture) if capture.bytes.is_empty() => {
                log::warn!("{}: empty screen capture", self.device.device_name());
                None
            }
            Ok(capture) => Bitmap::decode(&capture.bytes).map(|image| Frame {
                image,
                capture_ms: capture.duration_ms,
            }),
            Err(e) if e.is_disconnect() => {
                log::warn!("{}: device unreachable during capture: {e}", self.device.device_name());
                None
            }
            Err(e) => {
                log::warn!("{}: screen capture failed: {e}", self.device.device_name());
                None
            }
        }
    }

    /// First template (in order) that is on screen now. Records it, or the
    /// absence of a match, as the last match.
    pub async fn which<'t>(&mut self, templates: &[&'t Template]) -> Option<&'t Template> {
        let found = match self.capture().await {
            Some(frame) => self.first_match(&frame, templates),
            None => None,
        };
        self.last_match = found.cloned();
        found
    }

    fn first_match<'t>(&self, frame: &Frame, templates: &[&'t Template]) -> Option<&'t Template> {
        templates.iter().copied().find(|template| {
            let started = std::time::Instant::now();
            let difference = self.engine.score_template(&frame.image, template);
            let matched = difference <= template.threshold();
            log::debug!(
                "Matching {template}... result={matched}, difference={difference:.6}, diffTime={}ms, capTime={}ms",
                started.elapsed().as_millis(),
                frame.capture_ms
            );
            matched
        })
    }

    pub async fn is_match(&mut self, templates: &[&Template]) -> bool {
        self.which(templates).await.is_some()
    }

    pub async fn is_not_match(&mut self, templates: &[&Template]) -> bool {
        self.which(templates).await.is_none()
    }

    /// Whether the last recorded match is one of `templates`, or, for an
    /// empty slice, whether anything was matched at all. Does not capture.
    pub fn matched(&self, templates: &[&Template]) -> bool {
        match &self.last_match {
            None => false,
            Some(_) if templates.is_empty() => true,
            Some(last) => templates.iter().any(|t| *t == last),
        }
    }

    /// Fail immediately unless one of `templates` is on screen.
    pub async fn assert_match<'t>(&mut self, templates: &[&'t Template]) -> AutomationResult<&'t Template> {
        self.which(templates)
            .await
            .ok_or_else(|| AutomationError::Assertion {
                templates: names(templates),
            })
    }

    /// Poll until one of `templates` appears. A poll that completes after the
    /// deadline still counts if it matched; the wait fails once the elapsed
    /// time exceeds `timeout`.
    pub async fn wait_for<'t>(
        &mut self,
        templates: &[&'t Template],
        timeout: Option<Duration>,
    ) -> AutomationResult<&'t Template> {
        let timeout = timeout.unwrap_or(self.wait.default_timeout);
        let mut limiter = FrequencyLimiter::new(self.wait.interval_for(timeout));
        let started = Instant::now();
        loop {
            limiter.tick().await;
            if let Some(template) = self.which(templates).await {
                return Ok(template);
            }
            if started.elapsed() > timeout {
                return Err(timeout_error(timeout, templates));
            }
        }
    }

    /// Run `action` for as long as one of `templates` is on screen.
    pub async fn while_match(
        &mut self,
        templates: &[&Template],
        timeout: Option<Duration>,
        action: impl AsyncFnMut(&D) -> AutomationResult<()>,
    ) -> AutomationResult<()> {
        self.while_condition(templates, true, timeout, action).await
    }

    /// Run `action` for as long as none of `templates` is on screen.
    pub async fn while_not_match(
        &mut self,
        templates: &[&Template],
        timeout: Option<Duration>,
        action: impl AsyncFnMut(&D) -> AutomationResult<()>,
    ) -> AutomationResult<()> {
        self.while_condition(templates, false, timeout, action).await
    }

    async fn while_condition(
        &mut self,
        templates: &[&Template],
        on_match: bool,
        timeout: Option<Duration>,
        mut action: impl AsyncFnMut(&D) -> AutomationResult<()>,
    ) -> AutomationResult<()> {
        let timeout = timeout.unwrap_or(self.wait.default_timeout);
        let mut limiter = FrequencyLimiter::new(self.wait.interval_for(timeout));
        let started = Instant::now();
        loop {
            limiter.tick().await;
            if self.which(templates).await.is_some() != on_match {
                return Ok(());
            }
            action(&self.device).await?;
            if started.elapsed() > timeout {
                return Err(timeout_error(timeout, templates));
            }
        }
    }

    /// Center of `template` anywhere on screen, if it matches.
    pub async fn find(&mut self, template: &Template) -> Option<Point> {
        let Some(frame) = self.capture().await else {
            self.last_match = None;
            return None;
        };
        let result = self.engine.locate(&frame.image, template.image());
        self.record_find(template, &frame, result)
    }

    /// Like [`find`](Self::find) but compares edge maps.
    pub async fn find_edge(&mut self, template: &Template) -> Option<Point> {
        let Some(frame) = self.capture().await else {
            self.last_match = None;
            return None;
        };
        let result = self.engine.locate_edges(&frame.image, template.image());
        self.record_find(template, &frame, result)
    }

    fn record_find(&mut self, template: &Template, frame: &Frame, result: MatchResult) -> Option<Point> {
        let location = result
            .location
            .filter(|_| result.is_match(template.threshold()));
        log::debug!(
            "Finding {template}... result={:?}, difference={:.6}, capTime={}ms",
            location,
            result.difference,
            frame.capture_ms
        );
        self.last_match = location.map(|_| template.clone());
        location
    }

    /// Run `action` with the found position for as long as `template` is found.
    pub async fn while_find(
        &mut self,
        template: &Template,
        timeout: Option<Duration>,
        mut action: impl AsyncFnMut(&D, Point) -> AutomationResult<()>,
    ) -> AutomationResult<()> {
        let timeout = timeout.unwrap_or(self.wait.default_timeout);
        let mut limiter = FrequencyLimiter::new(self.wait.interval_for(timeout));
        let started = Instant::now();
        loop {
            limiter.tick().await;
            let Some(point) = self.find(template).await else {
                return Ok(());
            };
            action(&self.device, point).await?;
            if started.elapsed() > timeout {
                return Err(timeout_error(timeout, &[template]));
            }
        }
    }
}

fn names(templates: &[&Template]) -> String {
    templates
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn timeout_error(timeout: Duration, templates: &[&Template]) -> AutomationError {
    AutomationError::Timeout {
        timeout,
        templates: names(templates),
    }
}

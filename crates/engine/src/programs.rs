// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline programs.
//!
//! The set of programs is closed: a run's `program` field names one of
//! these variants and nothing else. Each body is a sequence of named
//! steps over a [`RunContext`], so every program is crash-resumable for
//! free.

use std::time::Duration;

use loom_adapters::{
    BrowserAdapter, BrowserError, CacheAdapter, GenerativeAdapter, RawItem,
};
use loom_core::{Clock, RetryPolicy, Stage, StageState, StepError};
use loom_storage::CostEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RunContext;
use crate::error::RuntimeError;
use crate::pacer::Pacer;
use crate::runtime::Runtime;
use crate::subrun::invoke_and_await;

/// Closed set of runnable programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgramKind {
    /// Cache-first headline pipeline: refresh on miss, snapshot, diff,
    /// fan out per new entity.
    HeadlineAcquisition,
    /// The actual scrape of the headline source.
    HeadlineRefresh,
    /// Fetch one article and register it as an entity.
    ArticleCapture,
    /// Re-capture entities whose selection stage previously errored.
    RescrapeScan,
    /// Pick pending entities and generate topic material for them.
    TopicSelection,
}

loom_core::simple_display! {
    ProgramKind {
        HeadlineAcquisition => "headline-acquisition",
        HeadlineRefresh => "headline-refresh",
        ArticleCapture => "article-capture",
        RescrapeScan => "rescrape-scan",
        TopicSelection => "topic-selection",
    }
}

impl ProgramKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramKind::HeadlineAcquisition => "headline-acquisition",
            ProgramKind::HeadlineRefresh => "headline-refresh",
            ProgramKind::ArticleCapture => "article-capture",
            ProgramKind::RescrapeScan => "rescrape-scan",
            ProgramKind::TopicSelection => "topic-selection",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "headline-acquisition" => Some(ProgramKind::HeadlineAcquisition),
            "headline-refresh" => Some(ProgramKind::HeadlineRefresh),
            "article-capture" => Some(ProgramKind::ArticleCapture),
            "rescrape-scan" => Some(ProgramKind::RescrapeScan),
            "topic-selection" => Some(ProgramKind::TopicSelection),
            _ => None,
        }
    }
}

/// A freshly captured (or cached) headline set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlineBatch {
    pub items: Vec<RawItem>,
}

/// Output of a headline acquisition run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionReport {
    /// True when the cache short-circuited the pipeline.
    pub cached: bool,
    /// Headlines in the batch.
    pub total: usize,
    /// New entities discovered by the diff.
    pub new: usize,
    /// Per-entity captures that completed.
    pub succeeded: usize,
    /// Per-entity captures that failed; recorded, not fatal.
    pub failed: usize,
}

/// Input to an article capture run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureInput {
    pub key: String,
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureReport {
    pub key: String,
    /// False when the entity already existed (concurrent discovery).
    pub inserted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scanned: usize,
    pub rescraped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionReport {
    pub considered: usize,
    pub selected: Vec<String>,
    pub failed: usize,
}

fn browser_step_error(e: BrowserError) -> StepError {
    if e.is_retryable() {
        StepError::transient(e.to_string())
    } else {
        StepError::validation(e.to_string())
    }
}

fn validate_items(items: Vec<RawItem>) -> Result<Vec<RawItem>, StepError> {
    for item in &items {
        if item.url.is_empty() || item.title.is_empty() {
            return Err(StepError::validation(format!(
                "item with empty url or title: {item:?}"
            )));
        }
    }
    Ok(items)
}

impl<C, P, B, G, K> Runtime<C, P, B, G, K>
where
    C: Clock,
    P: Pacer,
    B: BrowserAdapter,
    G: GenerativeAdapter,
    K: CacheAdapter,
{
    pub(crate) async fn dispatch(
        &self,
        kind: ProgramKind,
        ctx: &RunContext<C, P, B, G, K>,
    ) -> Result<Value, RuntimeError> {
        match kind {
            ProgramKind::HeadlineAcquisition => self.headline_acquisition(ctx).await,
            ProgramKind::HeadlineRefresh => self.headline_refresh(ctx).await,
            ProgramKind::ArticleCapture => self.article_capture(ctx).await,
            ProgramKind::RescrapeScan => self.rescrape_scan(ctx).await,
            ProgramKind::TopicSelection => self.topic_selection(ctx).await,
        }
    }

    /// Scrape the configured headline target. Runs as a sub-run of the
    /// acquisition pipeline so the expensive scrape has its own log and
    /// retry budget.
    async fn headline_refresh(
        &self,
        ctx: &RunContext<C, P, B, G, K>,
    ) -> Result<Value, RuntimeError> {
        let policy = self.inner.config.scrape_retry();
        let batch: HeadlineBatch = ctx
            .run_step("scrape", &policy, || async {
                let items = self
                    .inner
                    .browser
                    .acquire(&self.inner.config.headline_target)
                    .await
                    .map_err(browser_step_error)?;
                Ok(HeadlineBatch {
                    items: validate_items(items)?,
                })
            })
            .await?;
        Ok(serde_json::to_value(batch)?)
    }

    /// Cache-first acquisition pipeline, steps 1-7.
    async fn headline_acquisition(
        &self,
        ctx: &RunContext<C, P, B, G, K>,
    ) -> Result<Value, RuntimeError> {
        let cache_key = self.inner.config.cache_key.clone();
        let cached: Option<HeadlineBatch> = ctx
            .run_step("check-cache", &RetryPolicy::none(), || {
                let key = cache_key.clone();
                async move {
                    let raw = self
                        .inner
                        .cache
                        .get(&key)
                        .await
                        .map_err(|e| StepError::transient(e.to_string()))?;
                    // An unparsable entry counts as a miss, not a failure.
                    Ok(raw.and_then(|s| match serde_json::from_str(&s) {
                        Ok(batch) => Some(batch),
                        Err(e) => {
                            tracing::warn!(key = %key, error = %e, "discarding malformed cache entry");
                            None
                        }
                    }))
                }
            })
            .await?;

        if let Some(batch) = cached {
            tracing::info!(items = batch.items.len(), "headline cache hit");
            let report = AcquisitionReport {
                cached: true,
                total: batch.items.len(),
                new: 0,
                succeeded: 0,
                failed: 0,
            };
            return Ok(serde_json::to_value(report)?);
        }

        let refresh =
            invoke_and_await(ctx, "refresh", ProgramKind::HeadlineRefresh, Value::Null).await?;
        let batch: HeadlineBatch =
            serde_json::from_value(refresh.output.unwrap_or(Value::Null))?;

        ctx.run_step("update-cache", &RetryPolicy::none(), || {
            let key = cache_key.clone();
            let payload = serde_json::to_string(&batch);
            let ttl = self.inner.config.cache_ttl();
            async move {
                let payload = payload.map_err(|e| StepError::validation(e.to_string()))?;
                self.inner
                    .cache
                    .put(&key, &payload, ttl)
                    .await
                    .map_err(|e| StepError::transient(e.to_string()))
            }
        })
        .await?;

        let snapshot_name: String = ctx
            .run_step("save-snapshot", &RetryPolicy::none(), || {
                let payload = serde_json::to_value(&batch);
                async move {
                    let payload = payload.map_err(|e| StepError::validation(e.to_string()))?;
                    let meta = self
                        .inner
                        .snapshots
                        .save(&payload, self.now_utc())
                        .map_err(|e| StepError::transient(e.to_string()))?;
                    Ok(meta.name)
                }
            })
            .await?;
        tracing::debug!(snapshot = %snapshot_name, "headline snapshot saved");

        ctx.run_step("cleanup-old-snapshots", &RetryPolicy::none(), || async {
            self.inner
                .snapshots
                .prune_older_than(self.inner.config.snapshot_retention(), self.now_utc())
                .map_err(|e| StepError::transient(e.to_string()))
        })
        .await?;

        let new_items: Vec<CaptureInput> = ctx
            .run_step("find-new-entities", &RetryPolicy::none(), || async {
                let keyed: Vec<(String, &RawItem)> = batch
                    .items
                    .iter()
                    .map(|item| (loom_core::natural_key(&item.url), item))
                    .collect();
                let absent = self
                    .inner
                    .entities
                    .lock()
                    .absent_keys(keyed.iter().map(|(k, _)| k.as_str()));
                Ok(keyed
                    .into_iter()
                    .filter(|(k, _)| absent.contains(k))
                    .map(|(key, item)| CaptureInput {
                        key,
                        url: item.url.clone(),
                        title: item.title.clone(),
                    })
                    .collect::<Vec<_>>())
            })
            .await?;

        // Serial fan-out: one capture at a time, paced between items. A
        // failed capture is counted, not fatal to the batch.
        let mut succeeded = 0;
        let mut failed = 0;
        let delay = self.inner.config.fanout_delay();
        let last = new_items.len().saturating_sub(1);
        for (i, item) in new_items.iter().enumerate() {
            let label = format!("capture:{}", item.key);
            let input = serde_json::to_value(item)?;
            match invoke_and_await(ctx, &label, ProgramKind::ArticleCapture, input).await {
                Ok(_) => succeeded += 1,
                Err(RuntimeError::Terminated) => return Err(RuntimeError::Terminated),
                Err(err) => {
                    tracing::warn!(key = %item.key, error = %err, "capture sub-run failed");
                    failed += 1;
                }
            }
            if i < last {
                ctx.wait(&format!("pace:{}", item.key), delay).await?;
            }
        }

        let report = AcquisitionReport {
            cached: false,
            total: batch.items.len(),
            new: new_items.len(),
            succeeded,
            failed,
        };
        tracing::info!(
            total = report.total,
            new = report.new,
            succeeded,
            failed,
            "headline acquisition complete"
        );
        Ok(serde_json::to_value(report)?)
    }

    /// Fetch one article and register it durably. Discovery is keyed by
    /// natural identity, so concurrent capture of the same url is an
    /// insert-if-absent no-op.
    async fn article_capture(
        &self,
        ctx: &RunContext<C, P, B, G, K>,
    ) -> Result<Value, RuntimeError> {
        let input: CaptureInput = {
            let run = self.run_status(ctx.run_id().as_str())?;
            serde_json::from_value(run.input)?
        };

        let policy = self.inner.config.scrape_retry();
        let url = input.url.clone();
        ctx.run_step("fetch-article", &policy, || {
            let url = url.clone();
            async move {
                let items = self
                    .inner
                    .browser
                    .acquire(&url)
                    .await
                    .map_err(browser_step_error)?;
                Ok(items.len())
            }
        })
        .await?;

        let report: CaptureReport = ctx
            .run_step("register-entity", &RetryPolicy::none(), || {
                let input = input.clone();
                async move {
                    let inserted = self
                        .inner
                        .entities
                        .lock()
                        .discover(&input.key, &input.url, &input.title, self.now_ms())
                        .map_err(|e| StepError::transient(e.to_string()))?;
                    Ok(CaptureReport {
                        key: input.key,
                        inserted,
                    })
                }
            })
            .await?;
        Ok(serde_json::to_value(report)?)
    }

    /// Find entities whose selection stage errored and re-capture them
    /// serially, releasing the stage back to pending on success.
    async fn rescrape_scan(
        &self,
        ctx: &RunContext<C, P, B, G, K>,
    ) -> Result<Value, RuntimeError> {
        let stuck: Vec<CaptureInput> = ctx
            .run_step("find-errored", &RetryPolicy::none(), || async {
                let entities = self.inner.entities.lock();
                let mut stuck: Vec<CaptureInput> = entities
                    .all()
                    .filter(|e| e.status.selection == StageState::Error)
                    .map(|e| CaptureInput {
                        key: e.key.clone(),
                        url: e.url.clone(),
                        title: e.title.clone(),
                    })
                    .collect();
                stuck.sort_by(|a, b| a.key.cmp(&b.key));
                Ok(stuck)
            })
            .await?;

        let mut rescraped = 0;
        let mut failed = 0;
        let delay = self.inner.config.fanout_delay();
        let last = stuck.len().saturating_sub(1);
        for (i, item) in stuck.iter().enumerate() {
            let label = format!("rescrape:{}", item.key);
            let input = serde_json::to_value(item)?;
            match invoke_and_await(ctx, &label, ProgramKind::ArticleCapture, input).await {
                Ok(_) => {
                    self.release_stage(&item.key, Stage::Selection)?;
                    rescraped += 1;
                }
                Err(RuntimeError::Terminated) => return Err(RuntimeError::Terminated),
                Err(err) => {
                    tracing::warn!(key = %item.key, error = %err, "rescrape failed");
                    failed += 1;
                }
            }
            if i < last {
                ctx.wait(&format!("pace:{}", item.key), delay).await?;
            }
        }

        let report = ScanReport {
            scanned: stuck.len(),
            rescraped,
            failed,
        };
        Ok(serde_json::to_value(report)?)
    }

    /// Pick up to `selection_batch` pending entities and generate topic
    /// material for each. Generation cost is appended to the cost log.
    async fn topic_selection(
        &self,
        ctx: &RunContext<C, P, B, G, K>,
    ) -> Result<Value, RuntimeError> {
        let candidates: Vec<CaptureInput> = ctx
            .run_step("pick-candidates", &RetryPolicy::none(), || async {
                let entities = self.inner.entities.lock();
                let mut pending: Vec<&loom_core::Entity> = entities
                    .all()
                    .filter(|e| e.status.selection == StageState::Pending)
                    .collect();
                pending.sort_by_key(|e| e.discovered_at_ms);
                Ok(pending
                    .into_iter()
                    .take(self.inner.config.selection_batch)
                    .map(|e| CaptureInput {
                        key: e.key.clone(),
                        url: e.url.clone(),
                        title: e.title.clone(),
                    })
                    .collect::<Vec<_>>())
            })
            .await?;

        let model = self.inner.config.selection_model.clone();
        let mut selected = Vec::new();
        let mut failed = 0;
        for item in &candidates {
            match self.select_one(ctx, item, &model).await {
                Ok(()) => selected.push(item.key.clone()),
                Err(RuntimeError::Terminated) => return Err(RuntimeError::Terminated),
                Err(err) => {
                    tracing::warn!(key = %item.key, error = %err, "topic selection failed");
                    let in_progress = self
                        .entity(&item.key)
                        .is_some_and(|e| e.status.selection == StageState::InProgress);
                    if in_progress {
                        self.fail_stage(&item.key, Stage::Selection, &err.to_string())?;
                    }
                    failed += 1;
                }
            }
        }

        let report = SelectionReport {
            considered: candidates.len(),
            selected,
            failed,
        };
        Ok(serde_json::to_value(report)?)
    }

    async fn select_one(
        &self,
        ctx: &RunContext<C, P, B, G, K>,
        item: &CaptureInput,
        model: &str,
    ) -> Result<(), RuntimeError> {
        // A re-driven run sees the stage transitions its earlier
        // incarnation already made: Done means this entity is finished,
        // InProgress means it crashed mid-selection and resumes here.
        match self.entity(&item.key).map(|e| e.status.selection) {
            Some(StageState::Done) => return Ok(()),
            Some(StageState::InProgress) => {}
            _ => self.begin_stage(&item.key, Stage::Selection)?,
        }
        let prompt = format!("Summarize as a video topic: {} ({})", item.title, item.url);
        let policy = RetryPolicy::constant(2, Duration::from_secs(5));
        let generated: loom_adapters::Generation = ctx
            .run_step(&format!("generate:{}", item.key), &policy, || {
                let prompt = prompt.clone();
                let model = model.to_string();
                async move {
                    self.inner
                        .generative
                        .generate(&prompt, &model)
                        .await
                        .map_err(|e| {
                            if e.is_retryable() {
                                StepError::transient(e.to_string())
                            } else {
                                StepError::validation(e.to_string())
                            }
                        })
                }
            })
            .await?;

        if let Some(rate) = self.inner.generative.model_rate(model) {
            let entry = CostEntry {
                at_ms: self.now_ms(),
                run_id: ctx.run_id().clone(),
                model: model.to_string(),
                input_tokens: generated.input_tokens,
                output_tokens: generated.output_tokens,
                cost_usd: rate.cost_usd(&generated),
            };
            self.inner
                .costs
                .lock()
                .append(&entry)
                .map_err(RuntimeError::from)?;
        }

        self.finish_stage(&item.key, Stage::Selection)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "programs_tests.rs"]
mod tests;

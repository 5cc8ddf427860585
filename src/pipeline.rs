use crate::{
    aggregate::{self, Aggregate, ComponentScores},
    component,
    config::Config,
    decode,
    report::{self, ImageRecord, JobReport, ReportData},
    scorer::DamageScorer,
    util::{ensure_dir, now_report_stamp, now_rfc3339, now_unix_nanos, sanitize_filename, sha256_hex},
    validator::HouseValidator,
};
use anyhow::{Context, Result};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One uploaded file as received.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading input: {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { filename, bytes })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFiles {
    pub job_dir: PathBuf,
    pub pdf: PathBuf,
    pub json: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Report {
        job_id: String,
        aggregate: Aggregate,
        data: ReportData,
        records: Vec<ImageRecord>,
        skipped: Vec<String>,
        files: ReportFiles,
    },
    NoValidImages {
        records: Vec<ImageRecord>,
        skipped: Vec<String>,
    },
}

impl AnalysisOutcome {
    pub fn skipped(&self) -> &[String] {
        match self {
            AnalysisOutcome::Report { skipped, .. } => skipped,
            AnalysisOutcome::NoValidImages { skipped, .. } => skipped,
        }
    }
}

/// Decode → validate → score → tag → aggregate → render, one upload at a time.
#[derive(Clone)]
pub struct Pipeline {
    cfg: Config,
    validator: HouseValidator,
    scorer: DamageScorer,
}

impl Pipeline {
    pub fn new(cfg: &Config, validator: HouseValidator, scorer: DamageScorer) -> Self {
        Self {
            cfg: cfg.clone(),
            validator,
            scorer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Job ids hash the effective config, every upload and the request time,
    /// so concurrent requests never share an output directory.
    pub fn job_id(&self, uploads: &[Upload]) -> String {
        let mut material = sha256_hex(self.cfg.normalized_for_hash().as_bytes());
        for up in uploads {
            material.push(':');
            material.push_str(&up.filename);
            material.push(':');
            material.push_str(&sha256_hex(&up.bytes));
        }
        material.push_str(&format!(":{}", now_unix_nanos()));
        sha256_hex(material.as_bytes())
    }

    /// Runs one batch into `<out_root>/<job_id>`.
    pub fn run_batch(&self, uploads: &[Upload], out_root: &Path) -> Result<AnalysisOutcome> {
        let job_id = self.job_id(uploads);
        let job_dir = out_root.join(&job_id);
        self.run_job(&job_id, uploads, &job_dir)
    }

    pub fn run_job(&self, job_id: &str, uploads: &[Upload], job_dir: &Path) -> Result<AnalysisOutcome> {
        let started = now_rfc3339();
        let images_dir = job_dir.join("images");

        let mut scores = ComponentScores::default();
        let mut records = Vec::new();
        let mut skipped = Vec::new();
        let mut accepted_paths: Vec<PathBuf> = Vec::new();

        info!("job_id={job_id} uploads={}", uploads.len());

        for (i, up) in uploads.iter().enumerate() {
            if !decode::is_allowed_file(&up.filename, &self.cfg.uploads.allowed_extensions) {
                // Not reported to the user, unlike corrupt or rejected files.
                debug!("skipping unsupported file: {}", up.filename);
                records.push(ImageRecord::Unsupported {
                    filename: up.filename.clone(),
                });
                continue;
            }

            let img = match decode::decode_rgb(&up.bytes, self.cfg.uploads.max_file_bytes) {
                Ok(img) => img,
                Err(err) => {
                    warn!("corrupt upload {}: {:#}", up.filename, err);
                    skipped.push(format!("{} (Corrupt file)", up.filename));
                    records.push(ImageRecord::Corrupt {
                        filename: up.filename.clone(),
                        error: format!("{err:#}"),
                    });
                    continue;
                }
            };

            let validation = self
                .validator
                .validate(&img)
                .with_context(|| format!("validating {}", up.filename))?;
            let decision = validation.decision;

            if !decision.is_house {
                let reason = format!("Detected: {}", decision.top_label());
                info!("rejected {} verdict={:?} ({reason})", up.filename, decision.verdict);
                skipped.push(format!("{} ({reason})", up.filename));
                records.push(ImageRecord::Rejected {
                    filename: up.filename.clone(),
                    predictions: validation.predictions,
                    reason,
                });
                continue;
            }

            ensure_dir(&images_dir)?;
            let saved = images_dir.join(saved_name(i, &up.filename));
            img.save_with_format(&saved, ImageFormat::Png)
                .with_context(|| format!("saving accepted image: {}", saved.display()))?;
            accepted_paths.push(saved.clone());

            let score = self
                .scorer
                .score(&img)
                .with_context(|| format!("scoring {}", up.filename))?;
            let detected = component::detect(&decision.labels);
            let bucket = detected.bucket();
            scores.push(bucket, score);

            info!(
                "accepted {} component={} detected={:?} score={}",
                up.filename, bucket, detected, score
            );
            records.push(ImageRecord::Accepted {
                filename: up.filename.clone(),
                saved_as: saved.display().to_string(),
                predictions: validation.predictions,
                detected,
                component: bucket,
                score,
            });
        }

        let Some(representative) = accepted_paths.first() else {
            info!("job_id={job_id} no valid house images");
            return Ok(AnalysisOutcome::NoValidImages { records, skipped });
        };

        let agg = aggregate::aggregate(&scores);
        info!(
            "job_id={job_id} overall={} roof={:?} wall={:?} door={:?} severity={:?}",
            agg.overall, agg.roof, agg.wall, agg.door, agg.severity
        );

        let data = ReportData::new(&agg, representative, now_report_stamp());
        let pdf = job_dir.join(&self.cfg.report.pdf_filename);
        report::render_pdf(&self.cfg, &pdf, &data)?;

        if self.cfg.debug.dump_effective_config {
            std::fs::write(
                job_dir.join("effective-config.toml"),
                self.cfg.normalized_for_hash(),
            )?;
        }

        let json = if self.cfg.report.write_json {
            let path = job_dir.join(&self.cfg.report.json_filename);
            let summary = JobReport {
                job_id: job_id.to_string(),
                started,
                finished: now_rfc3339(),
                aggregate: agg.clone(),
                images: records.clone(),
                skipped: skipped.clone(),
                degraded_scoring: self.scorer.is_degraded(),
            };
            report::write_json(&path, &summary)?;
            Some(path)
        } else {
            None
        };

        Ok(AnalysisOutcome::Report {
            job_id: job_id.to_string(),
            aggregate: agg,
            data,
            records,
            skipped,
            files: ReportFiles {
                job_dir: job_dir.to_path_buf(),
                pdf,
                json,
            },
        })
    }
}

fn saved_name(index: usize, filename: &str) -> String {
    let safe = sanitize_filename(filename);
    let stem = Path::new(&safe)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(safe);
    format!("{index:03}_{stem}.png")
}

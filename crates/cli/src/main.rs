use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qrml::cfg::PipelineCfg;
use qrml::quotient::QuotientOutcome;
use qrml::sample::{sample, SampleCfg, Shape};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

mod provenance;
mod table;

use provenance::{write_sidecar, Payload};

#[derive(Parser)]
#[command(name = "qrml")]
#[command(about = "Quotient recovery from point clouds")]
struct Cmd {
    /// Optional run label; propagated to provenance and logs
    #[arg(long, global = true)]
    tag: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Draw a seeded synthetic point cloud and write it as CSV
    Sample {
        #[arg(long, default_value = "disk")]
        shape: Shape,
        #[arg(long, default_value_t = 500)]
        n: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Run the pipeline on a point table and write all artifacts as JSON
    Run {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// JSON file with a (partial) pipeline configuration
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Print a provenance JSON block with the default configuration
    Report,
}

/// Single-parameter overrides applied on top of the config file.
#[derive(clap::Args, Debug, Default)]
struct Overrides {
    #[arg(long)]
    k: Option<usize>,
    #[arg(long)]
    threshold_var: Option<f64>,
    #[arg(long)]
    edge_sen: Option<f64>,
    #[arg(long)]
    s1: Option<f64>,
    #[arg(long)]
    k0: Option<usize>,
    /// Project to the estimated dimension instead of the plane
    #[arg(long)]
    no_two_d: bool,
    #[arg(long)]
    base_point: Option<usize>,
    #[arg(long)]
    alpha: Option<f64>,
    #[arg(long)]
    tol: Option<usize>,
    /// Tear-point ratio threshold
    #[arg(long)]
    tear_ratio: Option<f64>,
    #[arg(long)]
    connection_tol: Option<usize>,
    #[arg(long)]
    quotient_tol: Option<usize>,
    #[arg(long)]
    tol1: Option<usize>,
}

impl Overrides {
    fn apply(&self, cfg: &mut PipelineCfg) {
        fn set<T: Copy>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        set(&mut cfg.graph.k, self.k);
        set(&mut cfg.graph.threshold_var, self.threshold_var);
        set(&mut cfg.graph.edge_sen, self.edge_sen);
        set(&mut cfg.dimension.s1, self.s1);
        set(&mut cfg.projection.k0, self.k0);
        if self.no_two_d {
            cfg.projection.two_d = false;
        }
        if self.base_point.is_some() {
            cfg.projection.base_point = self.base_point;
        }
        set(&mut cfg.boundary.alpha, self.alpha);
        set(&mut cfg.boundary.tol, self.tol);
        set(&mut cfg.boundary.tear_ratio, self.tear_ratio);
        set(&mut cfg.quotient.connection_tol, self.connection_tol);
        set(&mut cfg.quotient.quotient_tol, self.quotient_tol);
        set(&mut cfg.quotient.tol1, self.tol1);
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Sample {
            shape,
            n,
            seed,
            noise,
            out,
        } => sample_cmd(
            SampleCfg {
                shape,
                n,
                seed,
                noise,
            },
            &out,
            cmd.tag,
        ),
        Action::Run {
            input,
            out,
            config,
            overrides,
        } => {
            let cfg = load_cfg(config.as_deref(), &overrides)?;
            run(&input, &out, cfg, cmd.tag)
        }
        Action::Report => report(cmd.tag),
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}

fn load_cfg(path: Option<&Path>, overrides: &Overrides) -> Result<PipelineCfg> {
    let mut cfg = match path {
        Some(p) => {
            let raw = fs::read(p).with_context(|| format!("reading config {}", p.display()))?;
            serde_json::from_slice(&raw).with_context(|| format!("parsing config {}", p.display()))?
        }
        None => PipelineCfg::default(),
    };
    overrides.apply(&mut cfg);
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

fn sample_cmd(cfg: SampleCfg, out: &Path, tag: Option<String>) -> Result<()> {
    tracing::info!(shape = %cfg.shape, n = cfg.n, seed = cfg.seed, tag = ?tag, "sample");
    let cloud = sample(cfg)?;
    ensure_parent(out)?;
    table::write_cloud(&cloud, out)?;
    let payload = Payload::new(serde_json::to_value(cfg)?)
        .with_summary(json!({ "points": cloud.len(), "dim": cloud.dim() }))
        .with_tag(tag);
    write_sidecar(out, payload)?;
    Ok(())
}

fn run(input: &Path, out: &Path, cfg: PipelineCfg, tag: Option<String>) -> Result<()> {
    tracing::info!(input = %input.display(), out = %out.display(), tag = ?tag, "run");
    let cloud = table::read_cloud(input)?;
    let artifacts = qrml::pipeline::run(&cloud, &cfg)
        .with_context(|| format!("pipeline failed on {}", input.display()))?;

    ensure_parent(out)?;
    fs::write(out, serde_json::to_vec_pretty(&artifacts)?)
        .with_context(|| format!("writing {}", out.display()))?;

    let outcome = match &artifacts.quotient {
        QuotientOutcome::Collapsed => json!({ "collapsed": true }),
        QuotientOutcome::Identified(q) => json!({
            "collapsed": false,
            "short_edges": q.refined.len(),
            "pairs": q.gluing.pairs,
        }),
    };
    let summary = json!({
        "points": cloud.len(),
        "edges": artifacts.graph.edge_count(),
        "global_dim": artifacts.dimension.global,
        "undefined_local_dims": artifacts.dimension.undefined.len(),
        "boundary_raw": artifacts.boundary.raw.len(),
        "boundary_cleaned": artifacts.boundary.cycle.len(),
        "tear_points": artifacts.boundary.tear_points.len(),
        "quotient": outcome,
    });
    let params = json!({ "input": input.to_string_lossy(), "cfg": cfg });
    write_sidecar(out, Payload::new(params).with_summary(summary).with_tag(tag))?;
    Ok(())
}

fn report(tag: Option<String>) -> Result<()> {
    let payload = Payload::new(json!({ "cfg": PipelineCfg::default() })).with_tag(tag);
    let doc = provenance::document(&payload, &[]);
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

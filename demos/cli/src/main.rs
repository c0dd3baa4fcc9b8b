use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Datelike, Utc};
use clap::Parser;
use futures::executor::block_on;
use futures::future::{FutureExt, LocalBoxFuture};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vizkit_core::WidgetKind;
use vizkit_ui::{
    CalendarHeatmap, Fetch, FetchError, FetchOutcome, FetchResponse, GanttChart, MemoryDom,
    NodeId, RenderOutcome, StackedBarChart, UiElement,
};

#[derive(Parser, Debug)]
#[command(
    name = "vizkit-cli",
    about = "Render a chart widget from a JSON payload file into SVG markup."
)]
struct Args {
    /// Widget to render: calendar, gantt or stacked-bar.
    #[arg(short, long)]
    kind: WidgetKind,
    /// Path to the JSON payload (an array of records).
    #[arg(short, long)]
    input: PathBuf,
    /// Host width in pixels.
    #[arg(long, default_value_t = 960.0)]
    width: f64,
    /// Host height in pixels; 0 lets the chart size itself.
    #[arg(long, default_value_t = 0.0)]
    height: f64,
    /// Calendar year, the current one when omitted.
    #[arg(long)]
    year: Option<i32>,
    /// Print a summary instead of the markup.
    #[arg(long)]
    summary: bool,
}

/// Serves the payload file for every request.
struct FileFetcher {
    body: String,
}

impl Fetch for FileFetcher {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<FetchResponse, FetchError>> {
        info!(%url, "serving payload from file");
        let body = self.body.clone();
        async move { Ok(FetchResponse::ok(body)) }.boxed_local()
    }
}

struct Report {
    records: usize,
    outcome: RenderOutcome,
    markup: String,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let body = std::fs::read_to_string(&args.input)
        .with_context(|| format!("could not read {:?}", args.input))?;

    let dom = MemoryDom::new();
    let host = dom.create_host(args.width, args.height);
    let fetcher = FileFetcher { body };
    let prefix = args
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let report = match args.kind {
        WidgetKind::Calendar => {
            let year = args.year.unwrap_or_else(|| Utc::now().year());
            let widget = CalendarHeatmap::new(dom.clone(), fetcher, host, prefix, year);
            run(&widget, &dom, host)?
        }
        WidgetKind::Gantt => {
            let widget = GanttChart::new(dom.clone(), fetcher, host, prefix);
            run(&widget, &dom, host)?
        }
        WidgetKind::StackedBar => {
            let widget = StackedBarChart::new(dom.clone(), fetcher, host, prefix);
            run(&widget, &dom, host)?
        }
    };

    if args.summary {
        println!(
            "Kind: {}\nRecords: {}\nRender: {}",
            args.kind,
            report.records,
            serde_json::to_string(&report.outcome)?
        );
    } else {
        println!("{}", report.markup);
    }

    Ok(())
}

/// Loads, renders and snapshots the host before the widget goes out of scope.
fn run<W: UiElement>(widget: &W, dom: &MemoryDom, host: NodeId) -> anyhow::Result<Report> {
    let records = match block_on(widget.obtain_datas()) {
        FetchOutcome::Loaded(count) => count,
        other => bail!("payload was rejected ({other:?}); see the log for the reason"),
    };
    let outcome = widget.render();
    Ok(Report {
        records,
        outcome,
        markup: dom.to_markup(host),
    })
}

use clap::{Parser, ValueEnum};
use site_harvest::{HarvestConfig, RenderMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-harvest")]
#[command(about = "Crawl one site and download every asset its pages reference")]
#[command(version)]
pub struct Args {
    /// Start URL; only URLs on its host are followed
    pub url: String,

    /// Output directory for pages, assets and the report
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of concurrent fetches
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Delay each worker sleeps after a request, in milliseconds
    #[arg(long)]
    pub delay: Option<u64>,

    /// Maximum number of pages to fetch
    #[arg(short, long)]
    pub max_pages: Option<usize>,

    /// Only download assets with these extensions (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub include_ext: Vec<String>,

    /// Never download assets with these extensions (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub exclude_ext: Vec<String>,

    /// Regex a URL must match to be followed (repeatable)
    #[arg(long = "include")]
    pub include_patterns: Vec<String>,

    /// Regex that excludes a URL (repeatable, wins over --include)
    #[arg(long = "exclude")]
    pub exclude_patterns: Vec<String>,

    /// Headless browser rendering
    #[arg(long, value_enum)]
    pub render: Option<RenderArg>,

    /// WebDriver URL used when rendering
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report file name inside the output directory
    #[arg(long)]
    pub report: Option<String>,

    /// Don't write visited pages to the output directory
    #[arg(long)]
    pub no_save_pages: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RenderArg {
    Off,
    Auto,
    Required,
}

impl From<RenderArg> for RenderMode {
    fn from(arg: RenderArg) -> Self {
        match arg {
            RenderArg::Off => RenderMode::Off,
            RenderArg::Auto => RenderMode::Auto,
            RenderArg::Required => RenderMode::Required,
        }
    }
}

impl Args {
    /// Apply the flags that were given on top of `config`
    pub fn apply(self, mut config: HarvestConfig) -> HarvestConfig {
        config.start_url = self.url;
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrency = concurrency;
        }
        if let Some(delay) = self.delay {
            config.delay_ms = delay;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if !self.include_ext.is_empty() {
            config.include_extensions = self.include_ext;
        }
        if !self.exclude_ext.is_empty() {
            config.exclude_extensions = self.exclude_ext;
        }
        if !self.include_patterns.is_empty() {
            config.include_patterns = self.include_patterns;
        }
        if !self.exclude_patterns.is_empty() {
            config.exclude_patterns = self.exclude_patterns;
        }
        if let Some(render) = self.render {
            config.render = render.into();
        }
        if let Some(webdriver_url) = self.webdriver_url {
            config.webdriver_url = webdriver_url;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if let Some(report) = self.report {
            config.report_file = report;
        }
        if self.no_save_pages {
            config.save_pages = false;
        }
        config
    }
}

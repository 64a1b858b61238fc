use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use rand::{SeedableRng as _, rngs::StdRng};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser, Debug)]
#[command(name = "shelfgrid", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the generation endpoint and static files.
    Serve(ServeArgs),
    /// Render a full grid to a PNG.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Listen port (default: $PORT or 3000).
    #[arg(long)]
    port: Option<u16>,

    /// Listen address.
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Directory served for GET requests (default: $SHELFGRID_PUBLIC_ROOT or ./public).
    #[arg(long)]
    public_root: Option<PathBuf>,

    /// Timeout for the downstream image call, in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// What to do when the downstream call times out.
    #[arg(long, value_enum)]
    timeout_policy: Option<PolicyChoice>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Canvas width in pixels.
    #[arg(long)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long)]
    height: u32,

    /// Number of cells.
    #[arg(long)]
    count: u32,

    /// Shelf material (wood, oak, walnut, marble, glass, anything else is metal).
    #[arg(long, default_value = "wood")]
    material: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Adapter server origin, e.g. http://127.0.0.1:3000. In-process adapter when absent.
    #[arg(long)]
    server: Option<String>,

    /// Seed for the material textures.
    #[arg(long)]
    seed: Option<u64>,

    /// Per-cell request timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyChoice {
    Fail,
    Fallback,
}

impl From<PolicyChoice> for shelfgrid::TimeoutPolicy {
    fn from(choice: PolicyChoice) -> Self {
        match choice {
            PolicyChoice::Fail => Self::Fail,
            PolicyChoice::Fallback => Self::Fallback,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Serve(args) => cmd_serve(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn timeout_from_ms(ms: Option<u64>) -> Option<Duration> {
    ms.filter(|&ms| ms > 0).map(Duration::from_millis)
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut server_cfg = shelfgrid::ServerConfig::from_env();
    if let Some(port) = args.port {
        server_cfg.bind.set_port(port);
    }
    if let Some(ip) = args.bind {
        server_cfg.bind = SocketAddr::new(ip, server_cfg.bind.port());
    }
    if let Some(root) = args.public_root {
        server_cfg.public_root = root;
    }

    let mut adapter_cfg = shelfgrid::AdapterConfig::from_env();
    if args.timeout_ms.is_some() {
        adapter_cfg.downstream_timeout = timeout_from_ms(args.timeout_ms);
    }
    if let Some(policy) = args.timeout_policy {
        adapter_cfg.timeout_policy = policy.into();
    }

    let adapter = shelfgrid::Adapter::from_config(&adapter_cfg)?;
    let server = shelfgrid::Server::bind(&server_cfg, adapter)?;
    if let Some(addr) = server.local_addr() {
        eprintln!("shelfgrid listening at http://{addr}");
    }
    server.serve()?;
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let spec = shelfgrid::GridSpec::new(args.width, args.height, args.count, &args.material)?;
    let timeout = timeout_from_ms(args.timeout_ms);

    let generator: Box<dyn shelfgrid::CellGenerator> = match &args.server {
        Some(url) => Box::new(shelfgrid::HttpGenerator::new(url, timeout)?),
        None => {
            let mut cfg = shelfgrid::AdapterConfig::from_env();
            if timeout.is_some() {
                cfg.downstream_timeout = timeout;
            }
            Box::new(shelfgrid::Adapter::from_config(&cfg)?)
        }
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut run = shelfgrid::GridRun::new(spec);
    let report = run.execute(&*generator, &mut rng, &mut |e: &shelfgrid::RunEvent| {
        eprintln!("{}", e.status_line())
    })?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let png = run.encode_png()?;
    std::fs::write(&args.out, png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    if report.failed() > 0 {
        eprintln!("{} of {} cells failed", report.failed(), report.total);
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pwhive::{
    Alphabet, HashStore, Hive, HiveConfig, Summary, Swarm, TrieStore, UniquenessStore, WriteSink,
};
use pwhive_gen::{Error, StoreKind, build_alphabet, open_output, store_capacity_hint};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pwhive-gen")]
#[command(about = "Generate a batch of unique random passwords, one per line")]
struct Args {
    /// Number of unique passwords to generate
    #[arg(short = 'n', long, default_value_t = 1_400_000)]
    count: u64,

    /// Length of each password in symbols
    #[arg(short, long, default_value_t = 12)]
    length: usize,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite an existing output file
    #[arg(long)]
    force: bool,

    /// Number of generator workers; 1 runs a single sequential generator
    #[arg(short = 'j', long, default_value = "1")]
    workers: usize,

    /// Uniqueness store implementation
    #[arg(long, value_enum, default_value_t = StoreKind::Hash)]
    store: StoreKind,

    /// Custom symbol pool (repeated symbols are dropped)
    #[arg(long)]
    alphabet: Option<String>,

    /// Use only the first N distinct symbols of the pool
    #[arg(long)]
    alphabet_size: Option<usize>,

    /// Abort after this many failed attempts in a row (default: retry forever)
    #[arg(long)]
    max_errors: Option<u64>,

    /// Print the symbols of the alphabet, one per line, and exit
    #[arg(long)]
    list_symbols: bool,

    /// Disable progress bar
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let alphabet = build_alphabet(args.alphabet.as_deref(), args.alphabet_size)?;
    if args.list_symbols {
        for symbol in alphabet.symbols() {
            println!("{symbol}");
        }
        return Ok(());
    }

    let mut config = HiveConfig::new(args.count, args.length);
    if let Some(max) = args.max_errors {
        config = config.max_consecutive_errors(max);
    }

    // Reject impossible runs before touching the output file.
    config.validate()?;
    config.check_capacity(&alphabet, 0)?;

    let sink = WriteSink::new(open_output(args.output.as_deref(), args.force)?);

    // Progress bar shares the terminal with stdout, so only show it for file output.
    let progress_bar = if !args.no_progress && args.output.is_some() {
        let pb = ProgressBar::new(args.count);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    info!(
        count = args.count,
        length = args.length,
        symbols = alphabet.size(),
        workers = args.workers,
        store = ?args.store,
        "generating passwords"
    );

    let run = Run { config, alphabet, workers: args.workers, progress_bar };
    let summary = match args.store {
        StoreKind::Hash => {
            let store = HashStore::with_capacity(store_capacity_hint(args.count));
            run.execute(store, sink).await?
        }
        StoreKind::Trie => run.execute(TrieStore::new(), sink).await?,
    };

    eprintln!("{summary}");
    Ok(())
}

struct Run {
    config: HiveConfig,
    alphabet: Alphabet,
    workers: usize,
    progress_bar: Option<ProgressBar>,
}

impl Run {
    async fn execute<S, W>(self, store: S, sink: WriteSink<W>) -> Result<Summary, Error>
    where
        S: UniquenessStore + 'static,
        W: std::io::Write + Send + 'static,
    {
        let progress_counter = Arc::new(AtomicU64::new(0));
        let total = self.config.gen_len;

        // Spawn progress updater task
        let progress_counter_clone = Arc::clone(&progress_counter);
        let progress_bar_clone = self.progress_bar.clone();
        let progress_task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(100)).await;
                let current = progress_counter_clone.load(Ordering::Relaxed);
                if let Some(ref pb) = progress_bar_clone {
                    pb.set_position(current);
                }
                if current >= total {
                    break;
                }
            }
        });

        let result = if self.workers <= 1 {
            let mut hive = Hive::new(self.config, self.alphabet, store, sink)?
                .with_progress(Arc::clone(&progress_counter));
            tokio::task::spawn_blocking(move || {
                let summary = hive.generate();
                hive.close();
                summary
            })
            .await
            .map_err(|e| Error::Io(std::io::Error::other(format!("Task panicked: {}", e))))?
        } else {
            let swarm = Swarm::new(self.config, self.alphabet, store, self.workers)?
                .with_progress(Arc::clone(&progress_counter));
            swarm.run(sink).await.map(|(summary, store, _sink)| {
                let released = store.destroy();
                debug!(released, "uniqueness store destroyed");
                summary
            })
        };

        // Clean up progress
        progress_task.abort();
        if let Some(pb) = self.progress_bar {
            pb.finish_with_message("done");
        }

        Ok(result?)
    }
}

use std::io;
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use groupcmp::difference::{self, TestFamily};
use groupcmp::homogeneity::{self, HomogeneityTest, LeveneCenter};
use groupcmp::normality::{self, Aggregation, NormalityReport};
use groupcmp::pipeline::Strategy;
use groupcmp::{AnalysisConfig, Dataset, Error, Group, Result, TestVerdict, explore, report};

#[derive(Parser)]
#[command(
    name = "groupcmp",
    version,
    about = "Pick and run the right test for comparing a measurement across groups"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log test selection decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct Input {
    /// Delimited text file with a header row
    file: PathBuf,

    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,
}

#[derive(Args)]
struct Columns {
    /// Categorical column that defines the groups
    #[arg(long)]
    group: String,

    /// Numeric column to compare
    #[arg(long)]
    value: String,
}

#[derive(Args)]
struct Options {
    /// TOML file with analysis settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Significance level
    #[arg(long)]
    alpha: Option<f64>,

    /// Groups larger than this use Kolmogorov-Smirnov instead of Shapiro-Wilk
    #[arg(long)]
    large_sample_threshold: Option<usize>,

    /// Center used by Levene's test
    #[arg(long, value_enum)]
    levene_center: Option<LeveneCenter>,

    /// Output machine-readable JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the dataset and describe every group
    Explore {
        #[command(flatten)]
        input: Input,

        /// Column that defines the groups
        #[arg(long)]
        group: String,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Test each group for normality
    Normality {
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        columns: Columns,
        #[command(flatten)]
        options: Options,

        /// How group verdicts combine into one decision
        #[arg(long, value_enum)]
        aggregation: Option<Aggregation>,
    },

    /// Test the groups for equal variances
    Homogeneity {
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        columns: Columns,
        #[command(flatten)]
        options: Options,

        /// Test to run; auto picks Bartlett or Levene from the normality check
        #[arg(long, value_enum, default_value_t = Method::Auto)]
        method: Method,

        /// How group verdicts combine into one decision (auto only)
        #[arg(long, value_enum)]
        aggregation: Option<Aggregation>,
    },

    /// One-way ANOVA across all groups
    Anova {
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        columns: Columns,
        #[command(flatten)]
        options: Options,
    },

    /// Compare every pair of groups
    Pairwise {
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        columns: Columns,
        #[command(flatten)]
        options: Options,

        /// Welch's t-test or Mann-Whitney U
        #[arg(long, value_enum, default_value_t = TestFamily::Parametric)]
        family: TestFamily,
    },

    /// Run the full decision chain
    Analyze {
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        columns: Columns,
        #[command(flatten)]
        options: Options,

        /// Whether the recommendation gates the difference tests
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,

        /// How group verdicts combine into one decision
        #[arg(long, value_enum)]
        aggregation: Option<Aggregation>,
    },

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Method {
    Auto,
    Bartlett,
    Levene,
}

#[derive(Serialize)]
struct HomogeneityOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    normality: Option<NormalityReport>,
    homogeneity: TestVerdict,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "groupcmp=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

impl Input {
    fn load(&self) -> Result<Dataset> {
        if !self.delimiter.is_ascii() {
            return Err(Error::InvalidConfig(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )));
        }
        Dataset::from_path(&self.file, self.delimiter as u8)
    }

    fn groups(&self, columns: &Columns) -> Result<Vec<Group>> {
        let groups = self.load()?.groups(&columns.group, &columns.value)?;
        tracing::debug!(count = groups.len(), column = %columns.group, "partitioned dataset");
        Ok(groups)
    }
}

impl Options {
    fn config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(threshold) = self.large_sample_threshold {
            config.large_sample_threshold = threshold;
        }
        if let Some(center) = self.levene_center {
            config.levene_center = center;
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Explore { input, group, json } => {
            let exploration = explore::explore(&input.load()?, &group)?;
            if json {
                report::print_json(&exploration)?;
            } else {
                report::print_exploration(&exploration);
            }
        }
        Commands::Normality {
            input,
            columns,
            options,
            aggregation,
        } => {
            let mut config = options.config()?;
            if let Some(aggregation) = aggregation {
                config.aggregation = aggregation;
            }
            let result = normality::check_groups(&input.groups(&columns)?, &config)?;
            if options.json {
                report::print_json(&result)?;
            } else {
                report::print_normality(&result);
            }
        }
        Commands::Homogeneity {
            input,
            columns,
            options,
            method,
            aggregation,
        } => {
            let mut config = options.config()?;
            if let Some(aggregation) = aggregation {
                config.aggregation = aggregation;
            }
            let groups = input.groups(&columns)?;
            let (normality, verdict) = match method {
                Method::Auto => {
                    let normality = normality::check_groups(&groups, &config)?;
                    let test = HomogeneityTest::select(normality.normal);
                    let verdict = homogeneity::check(&groups, test, &config)?;
                    (Some(normality), verdict)
                }
                Method::Bartlett => (None, homogeneity::bartlett(&groups, &config)?),
                Method::Levene => (None, homogeneity::levene(&groups, &config)?),
            };
            if options.json {
                report::print_json(&HomogeneityOutput {
                    normality,
                    homogeneity: verdict,
                })?;
            } else {
                if let Some(normality) = &normality {
                    report::print_normality(normality);
                    println!();
                }
                report::print_homogeneity(&verdict);
            }
        }
        Commands::Anova {
            input,
            columns,
            options,
        } => {
            let config = options.config()?;
            let verdict = difference::anova(&input.groups(&columns)?, &config)?;
            if options.json {
                report::print_json(&verdict)?;
            } else {
                report::print_omnibus(&verdict);
            }
        }
        Commands::Pairwise {
            input,
            columns,
            options,
            family,
        } => {
            let config = options.config()?;
            let results = difference::pairwise(&input.groups(&columns)?, family, &config)?;
            if options.json {
                report::print_json(&results)?;
            } else {
                report::print_pairwise(&results);
            }
        }
        Commands::Analyze {
            input,
            columns,
            options,
            strategy,
            aggregation,
        } => {
            let mut config = options.config()?;
            if let Some(strategy) = strategy {
                config.strategy = strategy;
            }
            if let Some(aggregation) = aggregation {
                config.aggregation = aggregation;
            }
            let analysis = groupcmp::analyze(&input.groups(&columns)?, &config)?;
            if options.json {
                report::print_json(&analysis)?;
            } else {
                report::print_analysis(&analysis);
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "groupcmp", &mut io::stdout());
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

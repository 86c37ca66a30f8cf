use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use wallet_txflow::amount::{format_amount, to_minor_units};
use wallet_txflow::config::load_config;
use wallet_txflow::draft::{
    parse_fields, AddressRecord, CallContractDraft, DeployContractDraft, Draft, GasSettings, TransferDraft,
};
use wallet_txflow::lifecycle::{LifecycleState, Stage, TxEngine};
use wallet_txflow::observability::init_logging;
use wallet_txflow::runtime::WalletContext;
use wallet_txflow::TxError;

const PASSWORD_ATTEMPTS: usize = 3;

#[derive(Parser)]
#[command(name = "txflow-cli")]
#[command(about = "Build, review and send wallet transactions", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "txflow.toml")]
    config: PathBuf,

    /// Source address.
    #[arg(short, long)]
    from: String,

    /// Gas amount override.
    #[arg(long)]
    gas_amount: Option<u64>,

    /// Gas price override in native units.
    #[arg(long)]
    gas_price: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send native tokens. Use `--amount max` to sweep the whole balance.
    Transfer {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },
    /// Deploy a contract
    Deploy {
        #[arg(long)]
        bytecode: String,
        /// Initial fields as `value:Type,value:Type`.
        #[arg(long, default_value = "")]
        fields: String,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        issue_token_amount: Option<String>,
    },
    /// Call a contract (execute a script)
    Call {
        #[arg(long)]
        bytecode: String,
        #[arg(long)]
        amount: Option<String>,
    },
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_logging(&config.observability);

    let context = WalletContext::from_config(config)?;
    context.refresh_balances().await;
    let source = context.addresses.resolve(&cli.from)?;
    println!("Available: {}", format_amount(source.available_balance));

    let gas = GasSettings {
        gas_amount: cli.gas_amount,
        gas_price: cli.gas_price.as_deref().map(to_minor_units).transpose()?,
    };
    let draft = build_draft(cli.command, source, gas)?;

    let mut engine = TxEngine::new(context.client(), context.addresses.clone(), draft);
    if let Some(gate) = &context.password_gate {
        engine = engine.with_password_gate(gate.clone());
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    match run(&engine, &mut input).await {
        Ok(state) => report(&state),
        Err(e) => {
            let state = engine.state();
            eprintln!("{}", state.last_error.unwrap_or_else(|| e.to_string()));
            std::process::exit(1);
        }
    }
    Ok(())
}

fn build_draft(command: Commands, source: AddressRecord, gas: GasSettings) -> Result<Draft, TxError> {
    let optional = |value: Option<String>| -> Result<_, TxError> {
        Ok(value.as_deref().map(to_minor_units).transpose()?)
    };
    let draft = match command {
        Commands::Transfer { to, amount } => {
            let amount = if amount.eq_ignore_ascii_case("max") {
                source.available_balance
            } else {
                to_minor_units(&amount)?
            };
            Draft::Transfer(TransferDraft {
                source,
                destination: to,
                amount,
                gas,
            })
        }
        Commands::Deploy {
            bytecode,
            fields,
            amount,
            issue_token_amount,
        } => Draft::DeployContract(DeployContractDraft {
            source,
            bytecode,
            initial_fields: parse_fields(&fields)?,
            amount: optional(amount)?,
            issue_token_amount: issue_token_amount
                .map(|raw| {
                    alloy::primitives::U256::from_str_radix(raw.trim(), 10)
                        .map_err(|_| TxError::Validation(format!("Invalid token amount '{}'", raw)))
                })
                .transpose()?,
            gas,
        }),
        Commands::Call { bytecode, amount } => Draft::CallContract(CallContractDraft {
            source,
            bytecode,
            amount: optional(amount)?,
            gas,
        }),
    };
    Ok(draft)
}

async fn run(engine: &TxEngine, input: &mut Input) -> Result<LifecycleState, TxError> {
    let mut state = engine.build().await?;

    if state.consolidation_prompt {
        println!("This address has too many unspent outputs and must be consolidated first.");
        if !ask(input, "Consolidate now? [y/N] ").await? {
            engine.dismiss_consolidation()?;
            return Err(TxError::Rejected("Consolidation declined".to_string()));
        }
        state = engine.confirm_consolidation().await?;
    }

    if let Some(summary) = &state.summary {
        println!("{}", summary.describe());
    }
    if !ask(input, "Send? [y/N] ").await? {
        engine.cancel()?;
        return Err(TxError::Rejected("Transaction cancelled".to_string()));
    }

    state = engine.confirm().await?;
    let mut attempts = 0;
    while state.stage == Stage::AwaitingPassword {
        let password = prompt(input, "Password: ").await?;
        match engine.submit_password(&password).await {
            Ok(next) => state = next,
            Err(TxError::InvalidPassword) if attempts + 1 < PASSWORD_ATTEMPTS => {
                attempts += 1;
                eprintln!("Invalid password");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(state)
}

fn report(state: &LifecycleState) {
    let Some(outcome) = &state.outcome else {
        return;
    };
    println!("{}", outcome.message());
    for sent in &outcome.transactions {
        println!("  {}", sent.tx_id);
    }
    if let Some(contract_address) = &outcome.contract_address {
        println!("Contract address: {}", contract_address);
    }
}

async fn prompt(input: &mut Input, question: &str) -> Result<String, TxError> {
    let mut stdout = tokio::io::stdout();
    let io_err = |e: std::io::Error| TxError::Session(e.to_string());
    stdout.write_all(question.as_bytes()).await.map_err(io_err)?;
    stdout.flush().await.map_err(io_err)?;
    let line = input.next_line().await.map_err(io_err)?;
    Ok(line.unwrap_or_default().trim().to_string())
}

async fn ask(input: &mut Input, question: &str) -> Result<bool, TxError> {
    let answer = prompt(input, question).await?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

use std::path::PathBuf;

use clap::Parser;
use mapred::mrrt::{input, logging, output, sequential};
use tokio::fs::File;
use tokio::io::AsyncWriteExt as _;

#[derive(Parser)]
#[command(name = "mrsequential")]
struct Args {
    app: String,
    input_files: Vec<PathBuf>,
    /// Where to write the result.
    #[arg(long, default_value = "mr-out-0")]
    out: PathBuf,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::try_parse()?;
    logging::init(args.verbose);

    println!("app: {}, files: {:?}", args.app, args.input_files);
    let app = mapred::mrapps::get_app(&args.app)?;
    let inputs = input::path_records(args.input_files.as_slice()).await?;

    let result = sequential::run(app.as_ref(), inputs).await?;

    let mut out = File::create(&args.out).await?;
    out.write_all(output::table(&result).as_bytes()).await?;
    out.flush().await?;

    Ok(())
}

use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = casematch_api::Args::parse();

	casematch_api::run(args).await
}

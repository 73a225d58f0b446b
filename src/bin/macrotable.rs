use std::path::PathBuf;

use chrono::NaiveDate;

use clap::Parser;

use log::info;

use macrotable::{Pipeline, default_end_date, default_start_date, load_sources, write_combined, write_macrotable};


/// Build the weekly per-country macrotable from the six pandemic sources.
#[derive(Debug, Parser)]
#[command(name = "macrotable")]
struct Args {
	/// Directory containing demographics, epidemiology, health,
	/// hospitalizations, index and vaccinations CSV files
	input: PathBuf,

	/// File to write the weekly macrotable to
	#[arg(short, long, default_value = "macrotable.csv")]
	output: PathBuf,

	/// First day to include
	#[arg(long, default_value_t = default_start_date())]
	start: NaiveDate,

	/// Last day to include
	#[arg(long, default_value_t = default_end_date())]
	end: NaiveDate,

	/// Countries to include; all if omitted
	#[arg(long, num_args = 0..)]
	countries: Vec<String>,

	/// Also write the daily combined table to this file
	#[arg(long)]
	combined_output: Option<PathBuf>,
}


fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let pipeline = Pipeline::new(args.start, args.end, &args.countries)?;

	info!("loading sources from {} ...", args.input.display());
	let sources = load_sources(&args.input)?;
	let result = pipeline.run(&sources)?;

	if let Some(path) = args.combined_output.as_ref() {
		write_combined(path, &result.combined)?;
	}
	write_macrotable(&args.output, &result.weekly)?;
	println!("Macrotable saved to {}", args.output.display());
	Ok(())
}

//! Colbase command-line interface
//!
//! Usage:
//!   colbase write out.col 100000 [seed]
//!   colbase scan out.col
//!   colbase query out.col --select id,value --where value gt 250 \
//!       --agg sum value --groupby region

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use colbase::{
    AggFunc, Batch, ColError, ColumnSchema, ColumnType, ColumnVector, CompareOp, EncodingType,
    FileReader, FileWriter, Predicate, QueryExecutor, Result, Schema,
};

const ROW_GROUP_SIZE: u64 = 10_000;

#[derive(Parser, Debug)]
#[command(name = "colbase")]
#[command(about = "Columnar storage and analytical query engine")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate and write a synthetic dataset
    Write {
        /// Output file path
        output: PathBuf,
        /// Number of rows to generate
        num_rows: u64,
        /// RNG seed
        #[arg(default_value_t = 42)]
        seed: u64,
    },
    /// Display file metadata and page statistics
    Scan {
        /// Input file path
        input: PathBuf,
    },
    /// Execute a query
    Query {
        /// Input file path
        input: PathBuf,
        /// Comma-separated columns to project
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,
        /// Filter, repeatable (op: eq, ne, lt, le, gt, ge)
        #[arg(long = "where", num_args = 3, value_names = ["COLUMN", "OP", "VALUE"], action = ArgAction::Append)]
        filters: Vec<String>,
        /// Aggregation (func: count, sum, min, max)
        #[arg(long, num_args = 2, value_names = ["FUNC", "COLUMN"])]
        agg: Option<Vec<String>>,
        /// Group rows by a string column
        #[arg(long)]
        groupby: Option<String>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Write {
            output,
            num_rows,
            seed,
        } => write_synthetic(&output, num_rows, seed),
        Command::Scan { input } => scan_file(&input),
        Command::Query {
            input,
            select,
            filters,
            agg,
            groupby,
        } => query_file(&input, select, filters, agg, groupby),
    }
}

fn synthetic_schema() -> Schema {
    Schema::new(vec![
        ColumnSchema::new("id", ColumnType::Int64, EncodingType::Plain),
        ColumnSchema::new("value", ColumnType::Int64, EncodingType::Delta),
        ColumnSchema::new("category", ColumnType::Int32, EncodingType::Rle),
        ColumnSchema::new("region", ColumnType::String, EncodingType::Dictionary),
        ColumnSchema::new("status", ColumnType::String, EncodingType::Dictionary),
    ])
}

fn write_synthetic(output: &Path, num_rows: u64, seed: u64) -> Result<()> {
    let regions = ["north", "south", "east", "west"];
    let statuses = ["active", "pending", "closed"];

    let mut rng = StdRng::seed_from_u64(seed);
    let mut writer = FileWriter::create(output, synthetic_schema())?;

    let mut written = 0u64;
    while written < num_rows {
        let chunk = (num_rows - written).min(ROW_GROUP_SIZE) as usize;

        let mut ids = Vec::with_capacity(chunk);
        let mut values = Vec::with_capacity(chunk);
        let mut categories = Vec::with_capacity(chunk);
        let mut region_vals = Vec::with_capacity(chunk);
        let mut status_vals = Vec::with_capacity(chunk);

        for i in 0..chunk {
            ids.push((written + i as u64) as i64);
            values.push(rng.gen_range(0..=10_000i64));
            categories.push(rng.gen_range(1..=5i32));
            region_vals.push(regions[rng.gen_range(0..regions.len())].to_string());
            status_vals.push(statuses[rng.gen_range(0..statuses.len())].to_string());
        }

        writer.write_i64_column(0, &ids)?;
        writer.write_i64_column(1, &values)?;
        writer.write_i32_column(2, &categories)?;
        writer.write_string_column(3, &region_vals)?;
        writer.write_string_column(4, &status_vals)?;
        writer.flush_row_group()?;

        written += chunk as u64;
    }

    writer.close()?;
    println!("Generated {} rows in {}", num_rows, output.display());
    Ok(())
}

fn scan_file(input: &Path) -> Result<()> {
    let reader = FileReader::open(input)?;
    let metadata = reader.metadata();

    println!("File: {}", input.display());
    println!("Total rows: {}", metadata.total_rows);
    println!("Row groups: {}", metadata.row_groups.len());
    println!();
    println!("Schema:");
    for column in &metadata.schema.columns {
        println!(
            "  - {} (type={}, encoding={})",
            column.name, column.column_type, column.encoding
        );
    }

    println!();
    println!("Row Groups:");
    for (rg_idx, row_group) in metadata.row_groups.iter().enumerate() {
        println!("  Row Group {}: {} rows", rg_idx, row_group.num_rows);
        for (col_idx, chunk) in row_group.column_chunks.iter().enumerate() {
            println!("    Column {}:", metadata.schema.columns[col_idx].name);
            println!("      Offset: {}", chunk.file_offset);
            println!("      Size: {} bytes", chunk.total_size);
            for (page_idx, header) in chunk.page_headers.iter().enumerate() {
                print!(
                    "      Page {}: {} values, {} bytes",
                    page_idx, header.num_values, header.compressed_size
                );
                if let Some(stats) = &header.stats {
                    if let (Some(min), Some(max)) = (stats.min, stats.max) {
                        print!(", min={}, max={}", min, max);
                    }
                }
                println!();
            }
        }
    }
    Ok(())
}

fn query_file(
    input: &Path,
    select: Vec<String>,
    filters: Vec<String>,
    agg: Option<Vec<String>>,
    groupby: Option<String>,
) -> Result<()> {
    let reader = FileReader::open(input)?;
    let mut executor = QueryExecutor::new(&reader);

    if !select.is_empty() {
        executor.set_projection(select);
    }
    for parts in filters.chunks_exact(3) {
        let op: CompareOp = parts[1].parse()?;
        let value: i64 = parts[2].parse().map_err(|_| {
            ColError::InvalidArgument(format!("invalid filter value '{}'", parts[2]))
        })?;
        executor.add_filter(Predicate::new(parts[0].clone(), op, value));
    }
    let agg_func = match &agg {
        Some(parts) => {
            let func: AggFunc = parts[0].parse()?;
            executor.set_aggregation(func, parts[1].clone());
            Some(func)
        }
        None => None,
    };

    if let Some(group_column) = groupby {
        executor.set_group_by(group_column.clone());
        let results = executor.execute_group_by()?;
        println!("GROUP BY {}:", group_column);
        for (key, agg_result) in &results {
            print!("  {}: count={}", key, agg_result.count);
            if agg_func.is_some() || agg_result.sum != 0 {
                print!(", sum={}", agg_result.sum);
            }
            println!();
        }
    } else if let Some(func) = agg_func {
        let result = executor.execute_aggregate()?;
        println!("Aggregation result:");
        println!("  count: {}", result.count);
        if func != AggFunc::Count {
            println!("  sum: {}", result.sum);
            if let Some(min) = result.min {
                println!("  min: {}", min);
            }
            if let Some(max) = result.max {
                println!("  max: {}", max);
            }
        }
    } else {
        let batches = executor.execute_query()?;
        let total_rows: usize = batches.iter().map(|b| b.num_rows).sum();
        println!(
            "Query returned {} rows in {} batches",
            total_rows,
            batches.len()
        );
        if total_rows > 0 && total_rows <= 20 {
            println!();
            println!("First rows:");
            for batch in &batches {
                print_batch(batch);
            }
        }
    }
    Ok(())
}

fn print_batch(batch: &Batch) {
    for row in 0..batch.num_rows {
        let mut line = String::new();
        for (col, name) in batch.column_names.iter().enumerate() {
            if col > 0 {
                line.push_str(", ");
            }
            line.push_str(name);
            line.push('=');
            match &batch.columns[col] {
                ColumnVector::Int32(v) => line.push_str(&v[row].to_string()),
                ColumnVector::Int64(v) => line.push_str(&v[row].to_string()),
                ColumnVector::String(v) => line.push_str(&v[row]),
            }
        }
        println!("{}", line);
    }
}

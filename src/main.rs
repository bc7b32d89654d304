use std::fs;
use std::io;
use std::path;
use std::process;

use bytesize::ByteSize;
use env_logger;
use log;

use line_sort::ExternalSorterBuilder;

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: log::LevelFilter = arg_parser.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let tmp_dir: Option<&str> = arg_parser.value_of("tmp_dir");
    let chunk_size = arg_parser.value_of("chunk_size").expect("value has default");

    let input = arg_parser.value_of("input").expect("value has default");
    let input_stream = match fs::File::open(input) {
        Ok(file) => io::BufReader::new(file),
        Err(err) => {
            log::error!("input file opening error: {}", err);
            process::exit(1);
        }
    };

    let output = arg_parser.value_of("output").expect("value has default");
    let output_stream = match fs::File::create(output) {
        Ok(file) => io::BufWriter::new(file),
        Err(err) => {
            log::error!("output file creation error: {}", err);
            process::exit(1);
        }
    };

    let mut sorter_builder = ExternalSorterBuilder::new()
        .with_chunk_size(chunk_size.parse::<ByteSize>().expect("value is pre-validated").as_u64());

    if let Some(tmp_dir) = tmp_dir {
        sorter_builder = sorter_builder.with_tmp_dir(path::Path::new(tmp_dir));
    }

    let sorter = match sorter_builder.build() {
        Ok(sorter) => sorter,
        Err(err) => {
            log::error!("sorter initialization error: {}", err);
            process::exit(1);
        }
    };

    log::info!("sorting {} into {} (chunk size: {})", input, output, ByteSize(sorter.chunk_size()));

    match sorter.sort(input_stream, output_stream) {
        Ok(summary) => {
            if !summary.is_clean() {
                log::warn!(
                    "{} temporary objects left after sorting",
                    summary.cleanup_errors.len()
                );
            }
            log::info!("sorting completed");
        }
        Err(err) => {
            log::error!("data sorting error: {}", err);
            process::exit(1);
        }
    }
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("line-sort")
        .about("external line sorter")
        .arg(
            clap::Arg::new("input")
                .short('i')
                .long("input")
                .help("file to be sorted")
                .takes_value(true)
                .default_value("input.txt"),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("result file")
                .takes_value(true)
                .default_value("output.txt"),
        )
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .default_value("info")
                .possible_values(LOG_LEVELS),
        )
        .arg(
            clap::Arg::new("tmp_dir")
                .short('d')
                .long("tmp-dir")
                .help("directory to be used to store temporary data")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("chunk_size")
                .short('c')
                .long("chunk-size")
                .help("maximum size of lines sorted in memory at once")
                .takes_value(true)
                .default_value("400MiB")
                .validator(|v| match v.parse::<ByteSize>() {
                    Ok(size) if size.as_u64() > 0 => Ok(()),
                    Ok(_) => Err(String::from("Chunk size must be greater than zero")),
                    Err(err) => Err(format!("Chunk size format incorrect: {}", err)),
                }),
        )
        .get_matches()
}

fn init_logger(log_level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();
}

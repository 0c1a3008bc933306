use clap::{arg,crate_version,ArgAction,Command};
use convsoft::encoder::ConvEncoder;
use convsoft::fano::FanoDecoder;
use convsoft::relmat::ReliabilityMatrix;
use convsoft::stack::StackDecoder;
use rand::{Rng,SeedableRng};
use rand::rngs::StdRng;

const RCH: &str = "unreachable was reached";

/// comma-separated integers, decimal or 0x-prefixed hex
fn parse_int_list(list: &str) -> Result<Vec<u64>,Box<dyn std::error::Error>> {
    let mut values = Vec::new();
    for token in list.split(',') {
        let token = token.trim();
        let value = match token.strip_prefix("0x") {
            Some(hex_digits) => u64::from_str_radix(hex_digits,16)?,
            None => token.parse::<u64>()?
        };
        values.push(value);
    }
    Ok(values)
}

/// message symbols separated by spaces or commas
fn parse_symbols(text: &str) -> Result<Vec<u32>,Box<dyn std::error::Error>> {
    let mut symbols = Vec::new();
    for token in text.replace(','," ").split_whitespace() {
        symbols.push(token.parse::<u32>()?);
    }
    Ok(symbols)
}

fn join_symbols(symbols: &[u32]) -> String {
    symbols.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(" ")
}

fn main() {
    env_logger::init();
    // exit codes: 0 success, 1 decode failure (inside run), 2 bad
    // configuration or unparseable input
    if let Err(error) = run() {
        eprintln!("{}",error);
        std::process::exit(2);
    }
}

fn run() -> Result<(),Box<dyn std::error::Error>>
{
    let long_help =
"Examples:
---------
Encode:    `convsoft encode -c 3 -g 7,5 -m \"1 1 1 0 1 0 0\"`
Simulate:  `convsoft simulate -c 3 -g 7,5 -l 32 --noise 0.3 -a fano`";

    let algorithms = ["fano","stack"];

    let mut main_cmd = Command::new("convsoft")
        .about("Soft-decision sequential decoding of convolutional codes")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("encode")
        .arg(arg!(-c --constraints <LIST> "comma-separated register lengths, one per input bit").required(true))
        .arg(arg!(-g --genpolys <LIST> "comma-separated generator polynomials, repeat once per input bit")
            .action(ArgAction::Append).required(true))
        .arg(arg!(-m --message <SYMBOLS> "input symbols, separated by spaces or commas").required(true))
        .about("run the convolutional encoder over a message"));

    main_cmd = main_cmd.subcommand(Command::new("simulate")
        .arg(arg!(-c --constraints <LIST> "comma-separated register lengths, one per input bit").required(true))
        .arg(arg!(-g --genpolys <LIST> "comma-separated generator polynomials, repeat once per input bit")
            .action(ArgAction::Append).required(true))
        .arg(arg!(-a --algorithm <NAME> "decoding algorithm").value_parser(algorithms).default_value("fano"))
        .arg(arg!(-l --length <SYMBOLS> "random message length")
            .value_parser(clap::value_parser!(usize)).default_value("32"))
        .arg(arg!(-m --message <SYMBOLS> "decode this message instead of a random one"))
        .arg(arg!(-T --"init-threshold" <METRIC> "initial path metric threshold")
            .value_parser(clap::value_parser!(f32)).default_value("0").allow_hyphen_values(true))
        .arg(arg!(-d --"delta-threshold" <METRIC> "threshold step")
            .value_parser(clap::value_parser!(f32)).default_value("1"))
        .arg(arg!(--"cache-size" <NODES> "tree cache size, 0 disables the cache")
            .value_parser(clap::value_parser!(u32)).default_value("0"))
        .arg(arg!(--"delta-init-threshold" <METRIC> "initial threshold delta, negative enables unlooping")
            .value_parser(clap::value_parser!(f32)).default_value("0").allow_hyphen_values(true))
        .arg(arg!(--"metric-limit" <METRIC> "give up when the threshold falls below this metric")
            .value_parser(clap::value_parser!(f32)).allow_hyphen_values(true))
        .arg(arg!(--"node-limit" <NODES> "give up when more nodes have been created")
            .value_parser(clap::value_parser!(u32)))
        .arg(arg!(--"giveup-threshold" <METRIC> "stack algorithm give-up path metric")
            .value_parser(clap::value_parser!(f32)).allow_hyphen_values(true))
        .arg(arg!(--"no-tail-zeros" "do not assume a zero message tail"))
        .arg(arg!(--"edge-bias" <BIAS> "bias subtracted from every edge metric")
            .value_parser(clap::value_parser!(f32)).default_value("0").allow_hyphen_values(true))
        .arg(arg!(--noise <P> "probability mass spread over the wrong symbols of each column")
            .value_parser(clap::value_parser!(f32)).default_value("0.3"))
        .arg(arg!(--flips <COLUMNS> "number of columns whose best symbol is swapped with a wrong one")
            .value_parser(clap::value_parser!(usize)).default_value("0"))
        .arg(arg!(--seed <SEED> "seed for the message and channel randomness")
            .value_parser(clap::value_parser!(u64)))
        .arg(arg!(--dot <PATH> "write the decode tree to a Graphviz dot file"))
        .about("encode a message, disturb its reliabilities and decode it"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("encode") {
        let constraints: Vec<u32> = parse_int_list(cmd.get_one::<String>("constraints").expect(RCH))?
            .iter().map(|&c| c as u32).collect();
        let genpolys: Vec<Vec<u64>> = cmd.get_many::<String>("genpolys").expect(RCH)
            .map(|g| parse_int_list(g)).collect::<Result<_,_>>()?;
        let message = parse_symbols(cmd.get_one::<String>("message").expect(RCH))?;
        let mut encoder: ConvEncoder<u64> = ConvEncoder::new(constraints,genpolys)?;
        let out: Vec<u32> = message.iter().map(|&s| encoder.encode(s,true)).collect();
        println!("{}",join_symbols(&out));
    }

    if let Some(cmd) = matches.subcommand_matches("simulate") {
        let constraints: Vec<u32> = parse_int_list(cmd.get_one::<String>("constraints").expect(RCH))?
            .iter().map(|&c| c as u32).collect();
        let genpolys: Vec<Vec<u64>> = cmd.get_many::<String>("genpolys").expect(RCH)
            .map(|g| parse_int_list(g)).collect::<Result<_,_>>()?;
        let algorithm = cmd.get_one::<String>("algorithm").expect(RCH);
        let tail_zeros = !cmd.get_flag("no-tail-zeros");
        let edge_bias = *cmd.get_one::<f32>("edge-bias").expect(RCH);
        let noise = *cmd.get_one::<f32>("noise").expect(RCH);
        let flips = *cmd.get_one::<usize>("flips").expect(RCH);

        let mut rng: StdRng = match cmd.get_one::<u64>("seed") {
            Some(&seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng()
        };

        let mut encoder: ConvEncoder<u64> = ConvEncoder::new(constraints.clone(),genpolys.clone())?;
        let message: Vec<u32> = match cmd.get_one::<String>("message") {
            Some(text) => parse_symbols(text)?,
            None => {
                let length = *cmd.get_one::<usize>("length").expect(RCH);
                let alphabet = 1u32 << encoder.k();
                let m = encoder.m() as usize;
                (0..length)
                    .map(|t| match tail_zeros && t + m > length {
                        true => 0,
                        false => rng.random_range(0..alphabet)
                    })
                    .collect()
            }
        };

        // per-column reliabilities around the true codeword
        let nb_out = 1usize << encoder.n();
        let p_true = 1.0 - noise;
        let p_other = match nb_out > 1 {
            true => noise / (nb_out - 1) as f32,
            false => 0.0
        };
        let mut relmat = ReliabilityMatrix::new(encoder.n(),message.len());
        let mut codeword: Vec<u32> = Vec::new();
        let mut column = vec![0.0f32;nb_out];
        for &symbol in &message {
            let out = encoder.encode(symbol,true);
            codeword.push(out);
            column.fill(p_other);
            column[out as usize] = p_true;
            relmat.enter_column_auto(&column);
        }
        for _ in 0..flips {
            let position = rng.random_range(0..message.len());
            let wrong = (codeword[position] + 1 + rng.random_range(0..nb_out as u32 - 1)) % nb_out as u32;
            column.fill(p_other);
            column[wrong as usize] = p_true;
            relmat.enter_column(position,&column);
        }
        relmat.normalize()?;

        println!("message:  {}",join_symbols(&message));
        println!("codeword: {}",join_symbols(&codeword));

        let decoded: Option<Vec<u32>> = match algorithm.as_str() {
            "fano" => {
                let mut decoder: FanoDecoder<u64> = FanoDecoder::new(
                    constraints,
                    genpolys,
                    *cmd.get_one::<f32>("init-threshold").expect(RCH),
                    *cmd.get_one::<f32>("delta-threshold").expect(RCH),
                    *cmd.get_one::<u32>("cache-size").expect(RCH),
                    *cmd.get_one::<f32>("delta-init-threshold").expect(RCH))?;
                decoder.set_tail_zeros(tail_zeros);
                decoder.set_edge_bias(edge_bias);
                if let Some(&limit) = cmd.get_one::<f32>("metric-limit") {
                    decoder.set_metric_limit(limit);
                }
                if let Some(&limit) = cmd.get_one::<u32>("node-limit") {
                    decoder.set_node_limit(limit);
                }
                let decoded = decoder.decode(&relmat)?;
                decoder.print_stats(&mut std::io::stdout(),decoded.is_some())?;
                if let Some(path) = cmd.get_one::<String>("dot") {
                    let mut dot_file = std::fs::File::create(path)?;
                    decoder.print_dot(&mut dot_file)?;
                }
                decoded
            },
            "stack" => {
                let mut decoder: StackDecoder<u64> = StackDecoder::new(constraints,genpolys)?;
                decoder.set_tail_zeros(tail_zeros);
                decoder.set_edge_bias(edge_bias);
                if let Some(&giveup) = cmd.get_one::<f32>("giveup-threshold") {
                    decoder.set_giveup_threshold(giveup);
                }
                if let Some(&limit) = cmd.get_one::<u32>("node-limit") {
                    decoder.set_node_limit(limit);
                }
                let decoded = decoder.decode(&relmat)?;
                decoder.print_stats(&mut std::io::stdout(),decoded.is_some())?;
                if let Some(path) = cmd.get_one::<String>("dot") {
                    let mut dot_file = std::fs::File::create(path)?;
                    decoder.print_dot(&mut dot_file)?;
                }
                decoded
            },
            _ => {
                eprintln!("{} not supported",algorithm);
                return Err(Box::new(std::fmt::Error));
            }
        };

        match decoded {
            Some(decoded) => {
                println!("decoded:  {}",join_symbols(&decoded));
                println!("recovered: {}",decoded == message);
            },
            None => {
                println!("decoding failed");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

use std::io::{self, Write};
use std::process;
use std::time::Instant;

use hybrid_id::{
    Disambiguation, GeneratorConfig, HybridIdGenerator, ProfileRegistry, extract_node, is_valid,
    parse,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct EmitOpts {
    config: GeneratorConfig,
    prefix: Option<String>,
    count: usize,
    json: bool,
}

fn print_help() {
    eprintln!(
        "hybrid-id - HybridId generator CLI\n\n\
Usage:\n  hybrid-id next [--profile <name>] [--node <node>] [--require-node] [--prefix <p>] [--disambiguation random|counter]\n  hybrid-id stream [...next flags] [--count <n>]\n  hybrid-id validate <id>\n  hybrid-id parse <id> [--json]\n  hybrid-id node <id>\n  hybrid-id profiles [--json]\n  hybrid-id healthcheck [...next flags] [--json]\n  hybrid-id bench [...next flags] [--count <n>]\n\n\
Environment:\n  HYBRID_ID_PROFILE, HYBRID_ID_NODE, HYBRID_ID_REQUIRE_NODE, HYBRID_ID_DISAMBIGUATION\n  RUST_LOG (default: warn)\n  For stream: --count 0 means infinite stream\n"
    );
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {flag}"))
}

fn parse_emit_flags(
    args: &[String],
    base: GeneratorConfig,
    allow_count: bool,
) -> Result<EmitOpts, String> {
    let mut opts = EmitOpts {
        config: base,
        prefix: None,
        count: 0,
        json: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--profile" => {
                opts.config.profile = flag_value(args, i, "--profile")?.to_string();
                i += 2;
            }
            "--node" => {
                opts.config.node = Some(flag_value(args, i, "--node")?.to_string());
                i += 2;
            }
            "--prefix" => {
                opts.prefix = Some(flag_value(args, i, "--prefix")?.to_string());
                i += 2;
            }
            "--disambiguation" => {
                let raw = flag_value(args, i, "--disambiguation")?;
                opts.config.disambiguation = Disambiguation::parse(raw)
                    .ok_or_else(|| "--disambiguation must be random or counter".to_string())?;
                i += 2;
            }
            "--require-node" => {
                opts.config.require_explicit_node = true;
                i += 1;
            }
            "--json" => {
                opts.json = true;
                i += 1;
            }
            "--count" if allow_count => {
                opts.count = flag_value(args, i, "--count")?
                    .parse::<usize>()
                    .map_err(|_| "invalid integer for --count".to_string())?;
                i += 2;
            }
            _ => return Err(format!("unknown flag: {}", args[i])),
        }
    }

    Ok(opts)
}

fn env_config() -> Result<GeneratorConfig, String> {
    GeneratorConfig::from_env().map_err(|e| e.to_string())
}

fn build_generator(opts: &EmitOpts) -> Result<HybridIdGenerator, String> {
    HybridIdGenerator::new(opts.config.clone()).map_err(|e| e.to_string())
}

fn run_next(args: &[String]) -> Result<(), String> {
    let opts = parse_emit_flags(args, env_config()?, false)?;
    let generator = build_generator(&opts)?;
    let id = generator
        .generate(opts.prefix.as_deref())
        .map_err(|e| e.to_string())?;
    println!("{}", id);
    Ok(())
}

fn run_stream(args: &[String]) -> Result<(), String> {
    let opts = parse_emit_flags(args, env_config()?, true)?;
    let generator = build_generator(&opts)?;
    let mut stdout = io::stdout().lock();
    let mut emitted = 0usize;

    loop {
        if opts.count > 0 && emitted >= opts.count {
            break;
        }
        let id = generator
            .generate(opts.prefix.as_deref())
            .map_err(|e| e.to_string())?;
        writeln!(stdout, "{}", id).map_err(|e| e.to_string())?;
        stdout.flush().map_err(|e| e.to_string())?;
        emitted += 1;
    }

    Ok(())
}

fn run_healthcheck(args: &[String]) -> Result<(), String> {
    let opts = parse_emit_flags(args, env_config()?, false)?;
    let generator = build_generator(&opts)?;
    let a = generator
        .generate(opts.prefix.as_deref())
        .map_err(|e| e.to_string())?;
    let b = generator
        .generate(opts.prefix.as_deref())
        .map_err(|e| e.to_string())?;
    let ok = generator.is_valid(&a) && generator.is_valid(&b) && a < b;

    if opts.json {
        let payload = json!({
            "ok": ok,
            "profile": generator.profile().name(),
            "node": generator.node().as_str(),
            "disambiguation": generator.disambiguation().as_str(),
            "sample_id": b,
        });
        println!(
            "{}",
            serde_json::to_string(&payload).map_err(|e| e.to_string())?
        );
    } else {
        println!(
            "ok={} profile={} node={} sample={}",
            ok,
            generator.profile().name(),
            generator.node(),
            b
        );
    }

    if ok {
        Ok(())
    } else {
        Err("healthcheck failed".to_string())
    }
}

fn run_validate(args: &[String]) -> Result<(), String> {
    let id = args.first().ok_or("validate requires an id")?;
    if args.len() > 1 {
        return Err(format!("unknown flag: {}", args[1]));
    }

    let ok = is_valid(id);
    println!("{}", ok);
    if ok {
        Ok(())
    } else {
        Err("invalid hybrid id".to_string())
    }
}

fn run_parse(args: &[String]) -> Result<(), String> {
    let id = args.first().ok_or("parse requires an id")?;
    let mut json_out = false;
    for arg in &args[1..] {
        match arg.as_str() {
            "--json" => json_out = true,
            other => return Err(format!("unknown flag: {other}")),
        }
    }

    let parsed = parse(id).map_err(|e| e.to_string())?;
    if json_out {
        println!(
            "{}",
            serde_json::to_string(&parsed).map_err(|e| e.to_string())?
        );
    } else {
        println!("raw={}", parsed.raw);
        println!("prefix={}", parsed.prefix.as_deref().unwrap_or_default());
        println!("profile={}", parsed.profile);
        println!("timestamp={}", parsed.timestamp.to_rfc3339());
        println!("node={}", parsed.node);
        println!("disambiguator={}", parsed.disambiguator);
    }
    Ok(())
}

fn run_node(args: &[String]) -> Result<(), String> {
    let id = args.first().ok_or("node requires an id")?;
    let node = extract_node(id).map_err(|e| e.to_string())?;
    println!("{}", node);
    Ok(())
}

fn run_profiles(args: &[String]) -> Result<(), String> {
    let json_out = match args {
        [] => false,
        [flag] if flag == "--json" => true,
        [other, ..] => return Err(format!("unknown flag: {other}")),
    };

    let registry = ProfileRegistry::global();
    if json_out {
        let rows: Vec<_> = registry
            .profiles()
            .map(|p| {
                json!({
                    "name": p.name(),
                    "body_len": p.body_len(),
                    "max_id_len": p.max_id_len(),
                    "timestamp_width": p.timestamp_width(),
                    "node_width": p.node_width(),
                    "disambiguator_width": p.disambiguator_width(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string(&rows).map_err(|e| e.to_string())?
        );
    } else {
        for p in registry.profiles() {
            println!(
                "{} body={} max_id={} timestamp={} node={} disambiguator={}",
                p.name(),
                p.body_len(),
                p.max_id_len(),
                p.timestamp_width(),
                p.node_width(),
                p.disambiguator_width()
            );
        }
    }
    Ok(())
}

fn run_bench(args: &[String]) -> Result<(), String> {
    let mut opts = parse_emit_flags(args, env_config()?, true)?;
    if opts.count == 0 {
        opts.count = 100_000;
    }
    let generator = build_generator(&opts)?;

    let start = Instant::now();
    let mut failures = 0usize;
    for _ in 0..opts.count {
        if generator.generate(opts.prefix.as_deref()).is_err() {
            failures += 1;
        }
    }
    let secs = start.elapsed().as_secs_f64().max(1e-9);

    let payload = json!({
        "profile": generator.profile().name(),
        "disambiguation": generator.disambiguation().as_str(),
        "n": opts.count,
        "failures": failures,
        "seconds": secs,
        "ids_per_sec": opts.count as f64 / secs,
    });
    println!(
        "{}",
        serde_json::to_string(&payload).map_err(|e| e.to_string())?
    );
    Ok(())
}

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_help();
        process::exit(1);
    }

    if args[0] == "-h" || args[0] == "--help" || args[0] == "help" {
        print_help();
        return;
    }

    let cmd = args[0].as_str();
    let rest = &args[1..];

    let res = match cmd {
        "next" => run_next(rest),
        "stream" => run_stream(rest),
        "healthcheck" => run_healthcheck(rest),
        "validate" => run_validate(rest),
        "parse" => run_parse(rest),
        "node" => run_node(rest),
        "profiles" => run_profiles(rest),
        "bench" => run_bench(rest),
        _ => Err(format!("unknown command: {}", cmd)),
    };

    if let Err(err) = res {
        tracing::debug!(command = cmd, error = %err, "command failed");
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_emit_flags() {
        let opts = parse_emit_flags(
            &args(&[
                "--profile",
                "compact",
                "--node",
                "A1",
                "--require-node",
                "--prefix",
                "usr",
                "--disambiguation",
                "counter",
            ]),
            GeneratorConfig::default(),
            false,
        )
        .unwrap();
        assert_eq!(opts.config.profile, "compact");
        assert_eq!(opts.config.node.as_deref(), Some("A1"));
        assert!(opts.config.require_explicit_node);
        assert_eq!(opts.config.disambiguation, Disambiguation::Counter);
        assert_eq!(opts.prefix.as_deref(), Some("usr"));
    }

    #[test]
    fn test_parse_emit_flags_errors() {
        let base = GeneratorConfig::default;
        assert!(parse_emit_flags(&args(&["--count", "3"]), base(), false).is_err());
        assert_eq!(
            parse_emit_flags(&args(&["--count", "3"]), base(), true)
                .unwrap()
                .count,
            3
        );
        assert!(parse_emit_flags(&args(&["--node"]), base(), false).is_err());
        assert!(parse_emit_flags(&args(&["--disambiguation", "x"]), base(), false).is_err());
        assert!(parse_emit_flags(&args(&["--W", "4"]), base(), false).is_err());
    }

    #[test]
    fn test_flags_override_environment_defaults() {
        let base = GeneratorConfig::default().with_profile("extended");
        let opts = parse_emit_flags(&args(&["--profile", "standard"]), base.clone(), false).unwrap();
        assert_eq!(opts.config.profile, "standard");
        let kept = parse_emit_flags(&[], base, false).unwrap();
        assert_eq!(kept.config.profile, "extended");
    }

    #[test]
    fn test_build_generator_reports_config_errors() {
        let opts = parse_emit_flags(&args(&["--require-node"]), GeneratorConfig::default(), false)
            .unwrap();
        let err = build_generator(&opts).err().unwrap();
        assert!(err.contains("Node is required"));
    }
}

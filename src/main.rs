use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
};

use bumpalo::Bump;
use clap::Parser as _;
use lr_kit::*;
use tracing::{error, level_filters::LevelFilter};
use tracing_subscriber::{Layer, fmt, layer::SubscriberExt, registry, util::SubscriberInitExt};

/// 分析上下文无关文法, 构建 LR(0) / SLR(1) / LR(1) 分析表, 并可以用它分析一段程序.
#[derive(clap::Parser)]
struct AppArgs {
    /// 文法文件, 缺省时从标准输入读取.
    #[clap(short, long)]
    grammar: Option<PathBuf>,
    /// 开始符号, 缺省为第一条产生式的头部.
    #[clap(short, long)]
    symbol_start: Option<String>,
    #[clap(short, long, value_enum, default_value_t = Discipline::Lr1)]
    discipline: Discipline,
    /// 要分析的程序, 单词之间以空白分隔.
    #[clap(short, long)]
    input: Option<PathBuf>,
    #[clap(long, default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,
}

fn read_source(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut inp = String::new();
            io::stdin().read_to_string(&mut inp)?;
            Ok(inp)
        }
    }
}

fn print_analysis(parser: &Parser<'_>) {
    let grammar = parser.grammar();
    print!("{grammar}");
    println!();
    let first = grammar.first_sets();
    let follow = grammar.follow_sets();
    for &nt in grammar.non_terms() {
        let names = |set: Option<&std::collections::BTreeSet<SymbolId>>| {
            set.into_iter()
                .flatten()
                .map(|&t| grammar.name(t))
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "FIRST({0}) = {{{1}}}\tFOLLOW({0}) = {{{2}}}",
            grammar.name(nt),
            names(first.get(nt)),
            names(follow.get(nt))
        );
    }
    println!();
    let automaton = parser.automaton();
    let table = parser.table();
    for state in automaton.states() {
        let from = state.id();
        println!("I_{from}:");
        for item in state.items().items() {
            println!("{}", item.display(grammar));
        }
        println!("actions:");
        for (term, action) in table.actions(from).into_iter().flatten() {
            println!("{} {action}", grammar.name(term));
        }
        println!("gotos:");
        for (sym, to) in state.transitions() {
            println!("I_{from} -- {} --> I_{to}", grammar.name(sym));
        }
        println!();
    }
    println!("--- {} Table ---", parser.discipline());
    println!("{}", table.to_markdown(grammar));
    if table.has_conflicts() {
        println!();
        println!("--- Conflicts ---");
        for conflict in table.conflicts() {
            println!("{}", conflict.describe(grammar));
        }
    }
}

fn print_parsed(grammar: &Grammar<'_>, parsed: &Parsed) {
    println!("--- Syntax Tree ---");
    print!("{}", parsed.tree.to_pretty(grammar));
    println!();
    println!("--- Reductions ---");
    for prod in parsed.derivation.productions() {
        println!("{:>4} {}", prod, grammar.prod(*prod));
    }
    println!();
    println!("--- Rightmost Derivation ---");
    let forms = parsed.derivation.sentential_forms(grammar);
    for (idx, form) in forms.iter().enumerate() {
        let line = form
            .iter()
            .map(|&s| grammar.name(s))
            .collect::<Vec<_>>()
            .join(" ");
        if idx + 1 == forms.len() {
            println!("{line}");
        } else {
            println!("{line} =>");
        }
    }
}

fn main() -> ExitCode {
    let args = AppArgs::parse();
    let layer = fmt::layer()
        .without_time()
        .with_writer(io::stderr)
        .with_filter(args.log_level);
    registry().with(layer).init();

    let inp = match read_source(args.grammar.as_ref()) {
        Ok(inp) => inp,
        Err(e) => {
            error!("cannot read grammar: {e}");
            return ExitCode::FAILURE;
        }
    };
    let bump = Bump::new();
    let grammar = match Grammar::from_cfg(&inp, args.symbol_start.as_deref(), &bump) {
        Ok(grammar) => grammar,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let parser = Parser::new(&grammar, args.discipline);
    print_analysis(&parser);

    let Some(input) = args.input else {
        return ExitCode::SUCCESS;
    };
    let src = match fs::read_to_string(&input) {
        Ok(src) => src,
        Err(e) => {
            error!("cannot read {}: {e}", input.display());
            return ExitCode::FAILURE;
        }
    };
    println!();
    match parser.parse(Lexer::new(&src, &grammar)) {
        Ok(parsed) => {
            print_parsed(&grammar, &parsed);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{e}");
            ExitCode::FAILURE
        }
    }
}

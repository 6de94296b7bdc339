use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, Editor};

use mini_db::query::result::QueryResult;
use mini_db::repl::SqlHelper;
use mini_db::{DBConfig, MiniDB};

#[derive(Parser)]
#[command(name = "mini_db", about = "一个小型关系数据库引擎")]
struct Cli {
    /// SQL脚本文件；省略时进入交互模式
    sql_file: Option<String>,

    /// 存储基础目录
    #[arg(long)]
    data_dir: Option<String>,

    /// 数据库名称
    #[arg(long)]
    db_name: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    let config = DBConfig {
        data_dir: cli.data_dir,
        db_name: cli.db_name,
    };

    let mut db = match MiniDB::with_config(&config) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("初始化失败: {}", e);
            std::process::exit(1);
        }
    };

    let exit_code = match cli.sql_file {
        Some(file) => run_file(&mut db, &file),
        None => run_repl(&mut db),
    };
    // process::exit 不经过析构，先显式落盘
    drop(db);
    std::process::exit(exit_code);
}

/// 执行SQL脚本文件并打印每条语句的结果
fn run_file(db: &mut MiniDB, file: &str) -> i32 {
    match db.execute_sql_file(file) {
        Ok(results) => {
            for result in &results {
                print_result(result);
            }
            if let Err(e) = db.save() {
                eprintln!("数据库保存失败: {}", e);
                return 1;
            }
            0
        }
        Err(e) => {
            eprintln!("运行失败: {}", e);
            1
        }
    }
}

fn print_result(result: &Result<QueryResult, mini_db::error::DBError>) {
    match result {
        Ok(QueryResult::Success) => {}
        Ok(res) => println!("{}", res),
        Err(e) => eprintln!("执行错误: {}", e),
    }
}

/// 交互模式：按分号累积语句，支持若干元命令
fn run_repl(db: &mut MiniDB) -> i32 {
    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();
    let mut rl: Editor<SqlHelper, DefaultHistory> = match Editor::with_config(config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("无法初始化交互环境: {}", e);
            return 1;
        }
    };
    let mut helper = SqlHelper::new();
    helper.with_colored_prompt("\x1b[1;32mdb> \x1b[0m".to_string());
    rl.set_helper(Some(helper));

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { "db> " } else { " .. " };
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if buffer.is_empty() && trimmed.starts_with('.') {
                    let _ = rl.add_history_entry(trimmed);
                    if handle_meta_command(db, trimmed) {
                        break;
                    }
                    continue;
                }

                buffer.push_str(&line);
                buffer.push('\n');
                if !trimmed.ends_with(';') {
                    continue;
                }

                let sql = buffer.trim().to_string();
                buffer.clear();
                let _ = rl.add_history_entry(&sql);
                match db.execute_sql(&sql) {
                    Ok(results) => {
                        for result in &results {
                            print_result(result);
                        }
                    }
                    Err(e) => eprintln!("执行错误: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("读取输入失败: {}", e);
                return 1;
            }
        }
    }
    0
}

/// 处理元命令；返回true表示退出
fn handle_meta_command(db: &mut MiniDB, command: &str) -> bool {
    match command {
        ".exit" | ".quit" => return true,
        ".help" => {
            println!(".exit/.quit  退出");
            println!(".tables      列出所有表");
            println!(".save        立即落盘");
        }
        ".tables" => {
            for name in db.storage().catalog().table_names() {
                println!("{}", name);
            }
        }
        ".save" => {
            if let Err(e) = db.save() {
                eprintln!("保存失败: {}", e);
            }
        }
        _ => eprintln!("未知的元命令: {}（输入 .help 查看）", command),
    }
    false
}

//! 代理服务器主程序入口

use zoomerpedia::config::ProxyConfig;
use zoomerpedia::web::WebServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut config = ProxyConfig::load()?;

    // 简单的命令行参数解析
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    config.bind_addr = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --bind requires an address");
                    std::process::exit(1);
                }
            }
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    config.port = args[i + 1].parse().unwrap_or_else(|_| {
                        eprintln!("Error: Invalid port number");
                        std::process::exit(1);
                    });
                    i += 2;
                } else {
                    eprintln!("Error: --port requires a port number");
                    std::process::exit(1);
                }
            }
            "--origin" | "-o" => {
                if i + 1 < args.len() {
                    config.public_origin = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --origin requires a host:port value");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Error: Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 没有密钥时降级为纯URL重写代理，而不是启动失败
    if config.rewrite.enabled && config.llm.api_key.is_empty() {
        tracing::warn!("未设置 ANTHROPIC_API_KEY，章节改写已禁用，仅执行URL重写");
        config.rewrite.enabled = false;
    }

    tracing::info!(
        "访问示例: http://{}/wiki/Python_(programming_language)",
        config.public_origin
    );

    let server = WebServer::new(config);
    server.start().await?;

    Ok(())
}

fn print_help() {
    println!("Zoomerpedia Proxy Server");
    println!();
    println!("USAGE:");
    println!("    zoomerpedia [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -b, --bind <ADDRESS>     Bind address [default: 0.0.0.0]");
    println!("    -p, --port <PORT>        Port number [default: 8000]");
    println!("    -o, --origin <ORIGIN>    Public host:port used in rewritten URLs");
    println!("                             [default: localhost:8000]");
    println!("    -h, --help               Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    ANTHROPIC_API_KEY        API key for the rewriting service");
    println!("    ZOOMERPEDIA_*            Override any config value, e.g.");
    println!("                             ZOOMERPEDIA_MAX_CONCURRENT_REQUESTS=5");
    println!();
    println!("EXAMPLES:");
    println!("    zoomerpedia");
    println!("    zoomerpedia --bind 127.0.0.1 --port 9000 --origin localhost:9000");
}

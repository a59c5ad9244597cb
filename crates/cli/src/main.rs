//! # BitAcross CLI
//!
//! ダイレクトコールをオフラインで組み立て・署名・封筒化し、
//! ワーカーの結果を開くためのコマンドラインツール。
//!
//! 送信そのものは行わない。出力したJSON-RPCリクエストを任意の手段でワーカーに送り、
//! 返ってきた `result` を `open` に渡す。
//!
//! ## サブコマンド
//! - `address`: 署名鍵のEVMアドレスを表示
//! - `seal-sign-ethereum` / `seal-sign-bitcoin`: コールを署名して封筒化
//! - `open`: `bitacross_submitRequest` の結果をセッション鍵で開く
//! - `decode` / `encode`: 型名を指定したhexとJSONの相互変換

mod commands;

use clap::{Parser, Subcommand};
use commands::BitcoinMode;
use tracing_subscriber::EnvFilter;

/// BitAcross ダイレクトコールCLI
#[derive(Parser)]
#[command(name = "bitacross-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// 署名鍵の指定
#[derive(clap::Args)]
struct SignerArgs {
    /// secp256k1秘密鍵（hex）
    #[arg(long, env = "BITACROSS_SIGNER_KEY", hide_env_values = true)]
    signer_key: String,
}

/// 封筒化に必要なワーカー情報
#[derive(clap::Args)]
struct WorkerArgs {
    /// `author_getShieldingKey` の `result`（RpcReturnValueのhex）
    #[arg(long, env = "BITACROSS_SHIELDING_KEY")]
    shielding_key: String,

    /// `state_getMrenclave` で得た32バイトのmrenclave（hex）
    #[arg(long, env = "BITACROSS_MRENCLAVE")]
    mrenclave: String,

    /// JSON-RPCリクエストID
    #[arg(long, default_value_t = 1)]
    id: u64,
}

#[derive(Subcommand)]
enum Command {
    /// 署名鍵のEVMアドレスと公開鍵を表示する
    Address {
        #[command(flatten)]
        signer: SignerArgs,
    },
    /// SignEthereumコールを署名して封筒化する
    SealSignEthereum {
        #[command(flatten)]
        signer: SignerArgs,
        #[command(flatten)]
        worker: WorkerArgs,
        /// 32バイトの事前ハッシュ済みメッセージ（hex）
        #[arg(long)]
        message: String,
    },
    /// SignBitcoinコールを署名して封筒化する
    SealSignBitcoin {
        #[command(flatten)]
        signer: SignerArgs,
        #[command(flatten)]
        worker: WorkerArgs,
        /// ペイロード種別
        #[arg(long, value_enum)]
        mode: BitcoinMode,
        /// 署名対象のペイロード（hex）
        #[arg(long)]
        payload: String,
        /// taproot-spendable のマークルルート（hex、32バイト）
        #[arg(long, required_if_eq("mode", "taproot-spendable"))]
        merkle_root: Option<String>,
        /// with-tweaks のtweak（`<hex32>:<is_x_only>`、複数指定可）
        #[arg(long = "tweak")]
        tweaks: Vec<String>,
    },
    /// `bitacross_submitRequest` の結果をセッション鍵で開く
    Open {
        /// 封筒化時に出力されたセッション鍵（hex）
        #[arg(long)]
        session_key: String,
        /// JSON-RPCレスポンスの `result`（hex）
        result: String,
    },
    /// hexを指定型としてデコードしJSONで表示する
    Decode {
        /// 型名（例: `DirectCallSigned`, `[u8; 32]`）
        #[arg(long = "type")]
        type_name: String,
        /// ワイヤ表現（hex）
        hex: String,
    },
    /// JSONを指定型のワイヤ表現にエンコードする
    Encode {
        /// 型名
        #[arg(long = "type")]
        type_name: String,
        /// JSON値
        json: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = match cli.command {
        Command::Address { signer } => commands::address(&signer.signer_key)?,
        Command::SealSignEthereum {
            signer,
            worker,
            message,
        } => {
            let worker = commands::Worker::parse(&worker.shielding_key, &worker.mrenclave, worker.id)?;
            commands::seal_sign_ethereum(&signer.signer_key, &worker, &message)?
        }
        Command::SealSignBitcoin {
            signer,
            worker,
            mode,
            payload,
            merkle_root,
            tweaks,
        } => {
            let worker = commands::Worker::parse(&worker.shielding_key, &worker.mrenclave, worker.id)?;
            let payload = commands::bitcoin_payload(mode, &payload, merkle_root.as_deref(), &tweaks)?;
            commands::seal_sign_bitcoin(&signer.signer_key, &worker, payload)?
        }
        Command::Open {
            session_key,
            result,
        } => commands::open(&session_key, &result)?,
        Command::Decode { type_name, hex } => commands::decode(&type_name, &hex)?,
        Command::Encode { type_name, json } => commands::encode(&type_name, &json)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

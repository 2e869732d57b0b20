use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("nfcbridge {}", nfcbridge_host::VERSION);
        return Ok(SUCCESS);
    }

    println!("name: nfcbridge");
    println!("version: {}", nfcbridge_host::VERSION);
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("NFCBRIDGE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "features: pcsc={}, async={}, cli=true",
        cfg!(feature = "pcsc"),
        cfg!(feature = "async")
    );
    println!(
        "max_message_size: {}",
        nfcbridge_frame::MAX_INBOUND_PAYLOAD
    );

    Ok(SUCCESS)
}

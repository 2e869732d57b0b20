use nfcbridge_reader::{PcscReaderAccess, ReaderAccess, ReaderInfo};

use crate::cmd::ListReadersArgs;
use crate::exit::{reader_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_no_reader_hints, print_readers, OutputFormat};

pub fn run(_args: ListReadersArgs, format: OutputFormat) -> CliResult<i32> {
    let names = PcscReaderAccess::new()
        .list_readers()
        .map_err(|err| reader_error("reader enumeration failed", err))?;

    if names.is_empty() {
        print_no_reader_hints();
        return Ok(FAILURE);
    }

    print_readers(&ReaderInfo::enumerate(names), format);
    Ok(SUCCESS)
}

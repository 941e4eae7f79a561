//! Arrow IPC data files, as shipped by repositories saved with `datasets`.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use arrow::datatypes::SchemaRef;
use arrow::ipc::reader::{FileReader, StreamReader};
use arrow::record_batch::RecordBatch;

use crate::error::FetchError;

use super::read_error;

const IPC_FILE_MAGIC: &[u8; 6] = b"ARROW1";

/// Decode an Arrow IPC file, either stream or file format.
pub fn read_arrow(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>), FetchError> {
    let mut file = File::open(path).map_err(FetchError::Io)?;
    let mut magic = [0u8; 6];
    let is_file_format = match file.read_exact(&mut magic) {
        Ok(()) => &magic == IPC_FILE_MAGIC,
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => false,
        Err(err) => return Err(FetchError::Io(err)),
    };
    file.seek(SeekFrom::Start(0)).map_err(FetchError::Io)?;

    if is_file_format {
        let reader = FileReader::try_new(file, None).map_err(|source| read_error(path, source))?;
        let schema = reader.schema();
        let batches = reader
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| read_error(path, source))?;
        Ok((schema, batches))
    } else {
        let reader = StreamReader::try_new(BufReader::new(file), None)
            .map_err(|source| read_error(path, source))?;
        let schema = reader.schema();
        let batches = reader
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| read_error(path, source))?;
        Ok((schema, batches))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::ipc::writer::FileWriter;

    use super::*;

    #[test]
    fn ipc_file_format_is_accepted() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("train.arrow");

        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, false)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Int64Array::from(vec![7, 8]))],
        )
        .expect("batch");

        let file = File::create(&path).expect("create");
        let mut writer = FileWriter::try_new(file, &schema).expect("writer");
        writer.write(&batch).expect("write");
        writer.finish().expect("finish");

        let (_, batches) = read_arrow(&path).expect("read arrow");
        assert_eq!(batches.iter().map(RecordBatch::num_rows).sum::<usize>(), 2);
    }

    #[test]
    fn empty_file_is_a_read_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("broken.arrow");
        std::fs::write(&path, b"").expect("write");

        let err = read_arrow(&path).expect_err("should fail");
        assert!(matches!(err, FetchError::DataRead { .. }));
    }
}

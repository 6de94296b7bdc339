use crate::error::Result;
use crate::relop::{push_explain_line, Operator, Row};
use crate::storage::heap::{Record, RecordId};
use crate::storage::table::Schema;
use crate::storage::{ScanGuard, StorageEngine};

/// 全表扫描 - 按物理存储顺序逐行产出
///
/// 打开时在存储引擎上登记一个扫描句柄，close（或析构）时注销，
/// 由此可以随时检查是否有扫描泄漏。
pub struct FileScan {
    table: String,
    schema: Schema,
    records: Vec<Record>,
    cursor: usize,
    last_rid: Option<RecordId>,
    guard: Option<ScanGuard>,
}

impl FileScan {
    /// 在指定表上打开一次全表扫描
    pub fn open(storage: &StorageEngine, table: &str) -> Result<Self> {
        let (schema, records, guard) = storage.open_scan(table)?;
        Ok(Self {
            table: table.to_string(),
            schema,
            records,
            cursor: 0,
            last_rid: None,
            guard: Some(guard),
        })
    }

    /// 最近一次 next 产出行的记录ID，用于定位删除/更新目标
    pub fn last_rid(&self) -> Option<RecordId> {
        self.last_rid
    }
}

impl Operator for FileScan {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next(&mut self) -> Result<Option<Row>> {
        match self.records.get(self.cursor) {
            Some(record) => {
                self.cursor += 1;
                self.last_rid = Some(record.id());
                Ok(Some(record.values().to_vec()))
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        self.guard.take();
    }

    fn format_explain(&self, out: &mut String, indent: usize) {
        push_explain_line(out, indent, &format!("FileScan on {}", self.table));
    }
}

use std::fmt;

use bincode::{Decode, Encode};

use crate::error::{DBError, Result};
use crate::storage::table::Value;

/// 页ID类型
pub type PageId = u32;

/// 每页的槽位上限
pub const PAGE_CAPACITY: usize = 128;

/// 存储层的原始行表示
pub type RawRecord = Vec<Value>;

/// 记录ID - 指向堆文件中一条物理记录的不透明句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub struct RecordId {
    /// 页面ID
    pub page_id: PageId,
    /// 页内槽位
    pub slot: usize,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: usize) -> Self {
        Self { page_id, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page_id, self.slot)
    }
}

/// 运行时记录 - 扫描产出的一行数据及其记录ID
#[derive(Debug, Clone)]
pub struct Record {
    id: RecordId,
    data: RawRecord,
}

impl Record {
    pub fn new(id: RecordId, data: RawRecord) -> Self {
        Self { id, data }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn values(&self) -> &[Value] {
        &self.data
    }

    pub fn into_values(self) -> RawRecord {
        self.data
    }
}

/// 页面 - 定长槽位数组，空槽可复用
#[derive(Debug, Clone, Default, Encode, Decode)]
struct Page {
    slots: Vec<Option<RawRecord>>,
}

impl Page {
    /// 插入记录，页满时返回None
    fn insert(&mut self, record: RawRecord) -> Option<usize> {
        if let Some(slot) = self.slots.iter().position(|s| s.is_none()) {
            self.slots[slot] = Some(record);
            return Some(slot);
        }
        if self.slots.len() < PAGE_CAPACITY {
            self.slots.push(Some(record));
            return Some(self.slots.len() - 1);
        }
        None
    }

    fn slot_mut(&mut self, slot: usize) -> Option<&mut Option<RawRecord>> {
        self.slots.get_mut(slot)
    }
}

/// 堆文件 - 一张表的全部数据页
#[derive(Debug, Clone, Default, Encode, Decode)]
pub struct HeapFile {
    pages: Vec<Page>,
}

impl HeapFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条记录，返回其记录ID
    pub fn insert(&mut self, record: RawRecord) -> RecordId {
        for (page_id, page) in self.pages.iter_mut().enumerate() {
            if let Some(slot) = page.insert(record.clone()) {
                return RecordId::new(page_id as PageId, slot);
            }
        }

        // 现有页面都已满，开新页
        let mut page = Page::default();
        let slot = match page.insert(record) {
            Some(slot) => slot,
            None => 0, // 空页插入不会失败
        };
        self.pages.push(page);
        RecordId::new((self.pages.len() - 1) as PageId, slot)
    }

    /// 按记录ID删除一条记录
    pub fn delete(&mut self, id: RecordId) -> Result<()> {
        let slot = self.occupied_slot_mut(id)?;
        *slot = None;
        Ok(())
    }

    /// 按记录ID原地覆写一条记录
    pub fn update(&mut self, id: RecordId, record: RawRecord) -> Result<()> {
        let slot = self.occupied_slot_mut(id)?;
        *slot = Some(record);
        Ok(())
    }

    /// 按物理存储顺序取出全部记录
    pub fn scan(&self) -> Vec<Record> {
        let mut records = Vec::new();
        for (page_id, page) in self.pages.iter().enumerate() {
            for (slot, entry) in page.slots.iter().enumerate() {
                if let Some(data) = entry {
                    records.push(Record::new(
                        RecordId::new(page_id as PageId, slot),
                        data.clone(),
                    ));
                }
            }
        }
        records
    }

    fn occupied_slot_mut(&mut self, id: RecordId) -> Result<&mut Option<RawRecord>> {
        let slot = self
            .pages
            .get_mut(id.page_id as usize)
            .and_then(|page| page.slot_mut(id.slot))
            .ok_or_else(|| DBError::Storage(format!("记录 {} 不存在", id)))?;
        if slot.is_none() {
            return Err(DBError::Storage(format!("记录 {} 不存在", id)));
        }
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(n: i32) -> RawRecord {
        vec![Value::Int(n)]
    }

    #[test]
    fn test_insert_and_scan_order() {
        let mut heap = HeapFile::new();
        heap.insert(row(1));
        heap.insert(row(2));
        heap.insert(row(3));

        let records = heap.scan();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].values(), &[Value::Int(1)]);
        assert_eq!(records[1].values(), &[Value::Int(2)]);
        assert_eq!(records[2].values(), &[Value::Int(3)]);
    }

    #[test]
    fn test_delete_and_slot_reuse() {
        let mut heap = HeapFile::new();
        let id1 = heap.insert(row(1));
        heap.insert(row(2));

        heap.delete(id1).unwrap();
        assert_eq!(heap.scan().len(), 1);

        // 重复删除应该失败
        assert!(heap.delete(id1).is_err());

        // 空槽被复用
        let id3 = heap.insert(row(3));
        assert_eq!(id3, id1);
        assert_eq!(heap.scan().len(), 2);
    }

    #[test]
    fn test_update_in_place() {
        let mut heap = HeapFile::new();
        let id = heap.insert(row(1));
        heap.update(id, row(9)).unwrap();

        let records = heap.scan();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), id);
        assert_eq!(records[0].values(), &[Value::Int(9)]);
    }

    #[test]
    fn test_update_missing_record() {
        let mut heap = HeapFile::new();
        assert!(heap.update(RecordId::new(0, 0), row(1)).is_err());
        assert!(heap.delete(RecordId::new(5, 7)).is_err());
    }

    #[test]
    fn test_page_overflow_opens_new_page() {
        let mut heap = HeapFile::new();
        for i in 0..(PAGE_CAPACITY + 2) {
            heap.insert(row(i as i32));
        }

        let records = heap.scan();
        assert_eq!(records.len(), PAGE_CAPACITY + 2);
        // 超出容量的记录落在第二页
        assert_eq!(records[PAGE_CAPACITY].id().page_id, 1);
    }
}

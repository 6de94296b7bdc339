pub mod catalog;
pub mod heap;
pub mod table;

use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{DBError, Result};
use catalog::Catalog;
use heap::{HeapFile, RawRecord, Record, RecordId};
use table::{ColumnDef, Schema};

/// 目录元数据文件名
const CATALOG_FILE: &str = "catalog.json";

/// 扫描句柄守卫 - 打开时计数加一，释放时减一
///
/// 守卫保证每个扫描句柄恰好被释放一次：显式 close 和提前返回的
/// 析构走的是同一条 Drop 路径。
#[derive(Debug)]
pub struct ScanGuard {
    counter: Rc<Cell<usize>>,
}

impl ScanGuard {
    fn new(counter: Rc<Cell<usize>>) -> Self {
        counter.set(counter.get() + 1);
        Self { counter }
    }
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        self.counter.set(self.counter.get().saturating_sub(1));
    }
}

/// 存储引擎 - 管理目录元数据与各表的堆文件
pub struct StorageEngine {
    /// 数据库目录
    dir: PathBuf,
    /// 目录元数据
    catalog: Catalog,
    /// 各表的堆文件
    heaps: HashMap<String, HeapFile>,
    /// 当前打开的扫描句柄数
    open_scans: Rc<Cell<usize>>,
}

impl StorageEngine {
    /// 创建并初始化存储引擎
    ///
    /// # 参数
    /// * `base_dir` - 可选的存储基础目录，为None时使用默认目录"data"
    /// * `db_name` - 可选的数据库名称，为None时使用"default"
    pub fn new(base_dir: Option<&Path>, db_name: Option<&str>) -> Result<Self> {
        let base_dir = match base_dir {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from("data"),
        };
        let dir = base_dir.join(db_name.unwrap_or("default"));

        fs::create_dir_all(&dir)
            .map_err(|e| DBError::Io(format!("无法创建数据库目录: {}", e)))?;

        let mut engine = Self {
            dir,
            catalog: Catalog::new(),
            heaps: HashMap::new(),
            open_scans: Rc::new(Cell::new(0)),
        };
        engine.load()?;
        Ok(engine)
    }

    /// 从磁盘加载目录元数据和所有堆文件
    fn load(&mut self) -> Result<()> {
        let catalog_path = self.dir.join(CATALOG_FILE);
        if !catalog_path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(&catalog_path)
            .map_err(|e| DBError::Io(format!("无法读取目录元数据: {}", e)))?;
        self.catalog = serde_json::from_str(&content)
            .map_err(|e| DBError::Io(format!("无法解析目录元数据: {}", e)))?;

        for name in self.catalog.table_names() {
            let heap_path = self.heap_path(&name);
            let heap = if heap_path.exists() {
                let data = fs::read(&heap_path)
                    .map_err(|e| DBError::Io(format!("无法读取表文件: {}", e)))?;
                bincode::decode_from_slice(&data, bincode::config::standard())
                    .map_err(|e| DBError::Io(format!("无法解析表文件: {}", e)))?
                    .0
            } else {
                HeapFile::new()
            };
            self.heaps.insert(name, heap);
        }

        Ok(())
    }

    /// 把目录元数据和所有堆文件写回磁盘
    pub fn save(&mut self) -> Result<()> {
        let content = serde_json::to_string(&self.catalog)
            .map_err(|e| DBError::Io(format!("无法序列化目录元数据: {}", e)))?;
        fs::write(self.dir.join(CATALOG_FILE), content)
            .map_err(|e| DBError::Io(format!("无法写入目录元数据: {}", e)))?;

        for (name, heap) in &self.heaps {
            let data = bincode::encode_to_vec(heap, bincode::config::standard())
                .map_err(|e| DBError::Io(format!("无法序列化表文件: {}", e)))?;
            fs::write(self.heap_path(name), data)
                .map_err(|e| DBError::Io(format!("无法写入表文件: {}", e)))?;
        }

        Ok(())
    }

    fn heap_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.tbl", table))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // 以下是表管理方法
    /// 创建表
    pub fn create_table(&mut self, name: String, columns: Vec<ColumnDef>) -> Result<()> {
        self.catalog.add_table(name.clone(), Schema::new(columns))?;
        self.heaps.insert(name, HeapFile::new());
        Ok(())
    }

    /// 删除表
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        self.catalog.remove_table(name)?;
        self.heaps.remove(name);
        // 表文件删除失败不阻塞注销
        let _ = fs::remove_file(self.heap_path(name));
        Ok(())
    }

    // 以下是对表记录的操作
    /// 打开一次全表扫描，返回模式、物理序快照和句柄守卫
    pub fn open_scan(&self, table: &str) -> Result<(Schema, Vec<Record>, ScanGuard)> {
        let schema = self.catalog.schema_of(table)?.clone();
        let heap = self
            .heaps
            .get(table)
            .ok_or_else(|| DBError::Storage(format!("表 '{}' 缺少堆文件", table)))?;
        let records = heap.scan();
        let guard = ScanGuard::new(Rc::clone(&self.open_scans));
        Ok((schema, records, guard))
    }

    /// 当前打开的扫描句柄数
    pub fn open_scan_count(&self) -> usize {
        self.open_scans.get()
    }

    /// 追加一条记录
    pub fn insert_record(&mut self, table: &str, record: RawRecord) -> Result<RecordId> {
        let heap = self.heap_mut(table)?;
        Ok(heap.insert(record))
    }

    /// 按记录ID删除一条记录
    pub fn delete_record(&mut self, table: &str, id: RecordId) -> Result<()> {
        self.heap_mut(table)?.delete(id)
    }

    /// 按记录ID原地覆写一条记录
    pub fn update_record(&mut self, table: &str, id: RecordId, record: RawRecord) -> Result<()> {
        self.heap_mut(table)?.update(id, record)
    }

    /// 按增量调整表的行数统计
    pub fn adjust_row_count(&mut self, table: &str, delta: i64) -> Result<()> {
        self.catalog.adjust_row_count(table, delta)
    }

    fn heap_mut(&mut self, table: &str) -> Result<&mut HeapFile> {
        self.heaps
            .get_mut(table)
            .ok_or_else(|| DBError::Storage(format!("表 '{}' 缺少堆文件", table)))
    }
}

// 存储引擎销毁时自动落盘
impl Drop for StorageEngine {
    fn drop(&mut self) {
        if let Err(e) = self.save() {
            eprintln!("保存存储引擎时出错: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::table::{DataType, Value};
    use tempfile::TempDir;

    fn create_test_storage() -> (StorageEngine, TempDir) {
        let temp_dir = TempDir::new().expect("无法创建临时目录");
        let storage =
            StorageEngine::new(Some(temp_dir.path()), Some("test_db")).expect("无法创建存储引擎");
        (storage, temp_dir)
    }

    fn test_columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef {
                name: "id".to_string(),
                data_type: DataType::Int(32),
                not_null: true,
                unique: true,
                is_primary: true,
            },
            ColumnDef {
                name: "name".to_string(),
                data_type: DataType::Varchar(100),
                not_null: false,
                unique: false,
                is_primary: false,
            },
        ]
    }

    #[test]
    fn test_table_management() {
        let (mut storage, _temp_dir) = create_test_storage();

        storage.create_table("users".to_string(), test_columns()).unwrap();
        assert!(storage.catalog().has_table("users"));

        // 重复创建应该失败
        assert!(storage.create_table("users".to_string(), test_columns()).is_err());

        storage.drop_table("users").unwrap();
        assert!(!storage.catalog().has_table("users"));
        assert!(storage.drop_table("users").is_err());
    }

    #[test]
    fn test_record_operations() {
        let (mut storage, _temp_dir) = create_test_storage();
        storage.create_table("users".to_string(), test_columns()).unwrap();

        let id1 = storage
            .insert_record("users", vec![Value::Int(1), Value::String("Alice".to_string())])
            .unwrap();
        storage
            .insert_record("users", vec![Value::Int(2), Value::String("Bob".to_string())])
            .unwrap();

        let (schema, records, guard) = storage.open_scan("users").unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(records.len(), 2);
        drop(guard);

        storage
            .update_record("users", id1, vec![Value::Int(1), Value::String("Al".to_string())])
            .unwrap();
        let (_, records, _guard) = storage.open_scan("users").unwrap();
        assert_eq!(records[0].values()[1], Value::String("Al".to_string()));

        storage.delete_record("users", id1).unwrap();
        let (_, records, _guard) = storage.open_scan("users").unwrap();
        assert_eq!(records.len(), 1);

        // 重复删除应该失败
        assert!(storage.delete_record("users", id1).is_err());
    }

    #[test]
    fn test_scan_guard_counting() {
        let (mut storage, _temp_dir) = create_test_storage();
        storage.create_table("t".to_string(), test_columns()).unwrap();

        assert_eq!(storage.open_scan_count(), 0);
        let (_, _, guard1) = storage.open_scan("t").unwrap();
        let (_, _, guard2) = storage.open_scan("t").unwrap();
        assert_eq!(storage.open_scan_count(), 2);

        drop(guard1);
        assert_eq!(storage.open_scan_count(), 1);
        drop(guard2);
        assert_eq!(storage.open_scan_count(), 0);
    }

    #[test]
    fn test_persistence() {
        let temp_dir = TempDir::new().expect("无法创建临时目录");
        let temp_path = temp_dir.path().to_path_buf();

        // 第一次运行：写入数据并保存
        {
            let mut storage = StorageEngine::new(Some(&temp_path), Some("persist")).unwrap();
            storage.create_table("users".to_string(), test_columns()).unwrap();
            storage
                .insert_record("users", vec![Value::Int(1), Value::String("Alice".to_string())])
                .unwrap();
            storage.adjust_row_count("users", 1).unwrap();
            storage.save().unwrap();
        } // 析构时再次落盘

        // 第二次运行：加载并验证
        {
            let storage = StorageEngine::new(Some(&temp_path), Some("persist")).unwrap();
            assert!(storage.catalog().has_table("users"));
            assert_eq!(storage.catalog().row_count("users").unwrap(), 1);

            let (_, records, _guard) = storage.open_scan("users").unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].values()[0], Value::Int(1));
        }
    }

    #[test]
    fn test_unknown_table_errors() {
        let (mut storage, _temp_dir) = create_test_storage();

        assert!(storage.open_scan("missing").is_err());
        assert!(storage.insert_record("missing", vec![Value::Int(1)]).is_err());
        assert!(
            storage
                .delete_record("missing", RecordId::new(0, 0))
                .is_err()
        );
    }
}

use anyhow::{anyhow, Context, Result};
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, DistanceType, Table};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use tutor_core::corpus::CorpusStore;
use tutor_core::traits::{Embedder, VectorIndex};
use tutor_core::types::Neighbor;

use crate::schema::{build_index_schema, vector_dim, DISTANCE_COL, POSITION_COL};

const WRITE_BATCH: usize = 1000;

/// Corpus-wide index persisted as a LanceDB table.
///
/// Searches are exact L2 unless an ANN index has been created on the table;
/// `_distance` is reported as-is.
pub struct LanceIndex {
	table: Table,
	dim: usize,
	rows: usize,
}

impl LanceIndex {
	pub async fn open(db_path: &Path, table_name: &str) -> Result<Self> {
		let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
		let table = db
			.open_table(table_name)
			.execute()
			.await
			.with_context(|| format!("Failed to open table '{}' in {}", table_name, db_path.display()))?;
		let rows = table.count_rows(None).await?;
		let dim = vector_dim(&table.schema().await?).ok_or_else(|| anyhow!("table '{}' has no vector column", table_name))?;
		info!(table = table_name, rows, dim, "opened LanceDB index");
		Ok(Self { table, dim, rows })
	}

	/// Embed every chunk and write a fresh table; the db directory is replaced.
	pub async fn build(db_path: &Path, table_name: &str, corpus: &CorpusStore, embedder: &dyn Embedder) -> Result<Self> {
		if corpus.is_empty() {
			return Err(anyhow!("refusing to build an index over an empty corpus"));
		}
		if db_path.exists() {
			std::fs::remove_dir_all(db_path)?;
		}
		std::fs::create_dir_all(db_path)?;
		let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
		let dim = i32::try_from(embedder.dim())?;

		info!(chunks = corpus.len(), table = table_name, "building LanceDB index");
		let pb = ProgressBar::new(corpus.len() as u64);
		pb.set_style(
			ProgressStyle::default_bar()
				.template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")?
				.progress_chars("#>-"),
		);

		let mut table: Option<Table> = None;
		for (batch_no, batch) in corpus.chunks().chunks(WRITE_BATCH).enumerate() {
			let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
			let vectors = embedder.embed_batch(&texts)?;
			let offset = batch_no * WRITE_BATCH;
			let record_batch = to_record_batch(offset, batch, vectors, dim)?;
			let schema = record_batch.schema();
			let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
			if let Some(t) = &table {
				t.add(reader).execute().await?;
			} else {
				table = Some(db.create_table(table_name, reader).execute().await?);
			}
			pb.inc(batch.len() as u64);
		}
		pb.finish_with_message("index built");

		let table = table.ok_or_else(|| anyhow!("no rows written"))?;
		let rows = table.count_rows(None).await?;
		Ok(Self { table, dim: usize::try_from(dim)?, rows })
	}
}

#[async_trait]
impl VectorIndex for LanceIndex {
	fn len(&self) -> usize {
		self.rows
	}

	fn dim(&self) -> usize {
		self.dim
	}

	async fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
		if query.len() != self.dim {
			return Err(anyhow!("query has dim {}, index expects {}", query.len(), self.dim));
		}
		// Callers may pass an unbounded candidate count.
		let k = k.min(self.rows);
		if k == 0 {
			return Ok(Vec::new());
		}
		let mut stream = self
			.table
			.vector_search(query.to_vec())?
			.distance_type(DistanceType::L2)
			.limit(k)
			.execute()
			.await?;
		let mut hits = Vec::with_capacity(k);
		while let Some(batch) = stream.try_next().await? {
			let positions = column::<Int64Array>(&batch, POSITION_COL)?;
			let distances = column::<Float32Array>(&batch, DISTANCE_COL)?;
			for i in 0..batch.num_rows() {
				hits.push(Neighbor { position: usize::try_from(positions.value(i))?, distance: distances.value(i) });
			}
		}
		hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position)));
		hits.truncate(k);
		Ok(hits)
	}
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<T>())
		.ok_or_else(|| anyhow!("column '{}' missing or of unexpected type", name))
}

fn to_record_batch(offset: usize, chunks: &[tutor_core::types::Chunk], vectors: Vec<Vec<f32>>, dim: i32) -> Result<RecordBatch> {
	if vectors.len() != chunks.len() {
		return Err(anyhow!("embedder returned {} vectors for {} chunks", vectors.len(), chunks.len()));
	}
	let mut positions = Vec::with_capacity(chunks.len());
	for i in 0..chunks.len() {
		positions.push(i64::try_from(offset + i)?);
	}
	let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
	let areas: Vec<&str> = chunks.iter().map(|c| c.metadata.learning_area.as_str()).collect();
	let levels: Vec<&str> = chunks.iter().map(|c| c.metadata.level.as_str()).collect();
	let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
	let vectors: Vec<Option<Vec<Option<f32>>>> = vectors.into_iter().map(|v| Some(v.into_iter().map(Some).collect())).collect();

	let record_batch = RecordBatch::try_new(build_index_schema(dim), vec![
		Arc::new(Int64Array::from(positions)),
		Arc::new(StringArray::from(ids)),
		Arc::new(StringArray::from(areas)),
		Arc::new(StringArray::from(levels)),
		Arc::new(StringArray::from(texts)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim)),
	])?;
	Ok(record_batch)
}

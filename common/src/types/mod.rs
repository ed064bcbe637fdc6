pub mod ingestion_status;

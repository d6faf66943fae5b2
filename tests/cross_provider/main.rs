mod processing_e2e;
mod providers;

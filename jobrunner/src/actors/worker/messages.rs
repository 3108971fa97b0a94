pub enum WorkerMessage {
    Cancel,
}

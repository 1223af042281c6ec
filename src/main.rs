fn main() {
    sqs_dedup::app::startup::startup();
}

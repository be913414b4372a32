#[actix_web::main]
async fn main() -> std::io::Result<()> {
    order_document_server::run().await
}

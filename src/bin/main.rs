use anyhow::{Context, Error};
use motlupets::{
    checkout::CheckoutForm,
    endpoints::{self, admin},
    format_price,
    orders::{Order, OrderStatus, PaymentMethod},
    products::{Category, Product},
    validation, CartItemId, Config, EntryPoint, FileStore, OrderId, ProductId,
    Shop, Storefront,
};
use std::{path::PathBuf, sync::Arc};
use structopt::StructOpt;
use url::Url;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::from_args();

    log::debug!("Starting application with {:#?}", args);

    let mut config = Config::new(args.base_url.clone());
    if let Some(admin_email) = &args.admin_email {
        config = config.with_admin_email(admin_email);
    }

    let session_file = match &args.session {
        Some(path) => path.clone(),
        None => FileStore::default_path()
            .context("Unable to determine where to save the session")?,
    };
    log::debug!("Using the session at \"{}\"", session_file.display());

    let api = Storefront::new(config, Arc::new(FileStore::new(session_file)))?;
    let mut shop = Shop::new(api);

    // cookies only live as long as the process, so checking a saved
    // shopper session with the server would always fail and wipe it
    if let (Some(email), Some(password)) = (&args.email, &args.password) {
        shop.login(email, password).await?;
    } else {
        shop.restore_session()?;
    }

    run(&mut shop, args.cmd).await
}

async fn run(shop: &mut Shop, cmd: Command) -> Result<(), Error> {
    match cmd {
        Command::Login { email, password } => {
            let landing = shop.login(&email, &password).await?;
            println!("Logged in, continue at {}", landing);
        },
        Command::Logout => {
            let next = shop.logout().await?;
            println!("Logged out, continue at {}", next);
        },
        Command::Register {
            name,
            email,
            password,
        } => {
            let registration =
                validation::validate_registration(&name, &email, &password)?;
            endpoints::register(shop.api(), &registration).await?;
            println!("Check {} for your verification code", registration.email);
        },
        Command::VerifyOtp { email, otp } => {
            endpoints::verify_otp(shop.api(), &email, &otp).await?;
            println!("Email verified, you can now log in");
        },
        Command::ResendOtp { email } => {
            endpoints::resend_otp(shop.api(), &email).await?;
            println!("A new verification code is on its way");
        },
        Command::Products { category } => {
            let products = match category {
                Some(category) => {
                    endpoints::products_by_category(shop.api(), &category).await?
                },
                None => {
                    shop.fetch_products().await?;
                    shop.products().to_vec()
                },
            };
            for product in &products {
                print_product(product);
            }
        },
        Command::Product { id } => {
            match endpoints::product_details(shop.api(), &id).await? {
                Some(product) => {
                    print_product(&product);
                    if !product.description.is_empty() {
                        println!("    {}", product.description);
                    }
                    if shop.is_in_cart(&product.id) {
                        println!("    (in your cart)");
                    }
                },
                None => anyhow::bail!("No such product: {}", id),
            }
        },
        Command::Cart => {
            shop.fetch_cart().await?;
            print_cart(shop);
        },
        Command::CartAdd { product } => {
            shop.add_to_cart(&product).await?;
            print_cart(shop);
        },
        Command::CartRemove { product } => {
            shop.remove_from_cart(&product).await?;
            print_cart(shop);
        },
        Command::CartQty { item, change } => {
            shop.change_quantity(&item, change).await?;
            print_cart(shop);
        },
        Command::Wishlist => {
            shop.fetch_wishlist().await?;
            shop.wishlist().iter().for_each(print_product);
        },
        Command::WishlistAdd { product } => {
            shop.add_to_wishlist(&product).await?;
            shop.wishlist().iter().for_each(print_product);
        },
        Command::WishlistRemove { product } => {
            shop.remove_from_wishlist(&product).await?;
            shop.wishlist().iter().for_each(print_product);
        },
        Command::Orders => {
            let user_id = logged_in_user(shop)?;
            for order in endpoints::list_orders(shop.api(), &user_id).await? {
                print_order(&order);
            }
        },
        Command::CancelOrder { order } => {
            let user_id = logged_in_user(shop)?;
            let cancellation =
                endpoints::cancel_order(shop.api(), &user_id, &order).await?;
            println!("Order cancelled");
            if let Some(refund) = cancellation.refund_status {
                println!("{}", refund);
            }
        },
        Command::CheckoutCod(delivery) => {
            shop.fetch_cart().await?;
            let summary = shop.begin_checkout()?;
            let details = delivery.into_form().validate()?;
            let user_id = logged_in_user(shop)?;

            endpoints::place_cod_order(shop.api(), &user_id, &details).await?;
            println!(
                "Order placed, you will pay {} on delivery",
                format_price(summary.total)
            );
        },
        Command::Support { order, message } => {
            let user_id = logged_in_user(shop)?;
            endpoints::contact_support(shop.api(), &user_id, &order, &message)
                .await?;
            println!("Support message sent, we will contact you soon");
        },
        Command::AdminStats => {
            let stats = admin::stats(shop.api()).await?;
            println!("Products sold: {}", stats.total_products_sold);
            println!("Revenue: {}", format_price(stats.total_revenue));
        },
        Command::AdminUsers => {
            for user in admin::users(shop.api()).await? {
                println!("{}\t{}\t{}", user.id, user.name, user.email);
            }
        },
        Command::AdminOrders => {
            for order in admin::orders(shop.api()).await? {
                print_order(&order);
            }
        },
        Command::AdminSetStatus { order, status } => {
            admin::update_order_status(shop.api(), &order, &status).await?;
            println!("Order #{} is now {}", order.short_reference(), status);
        },
    }

    Ok(())
}

fn logged_in_user(shop: &Shop) -> Result<motlupets::UserId, Error> {
    shop.session()
        .and_then(|s| s.user_id.clone())
        .with_context(|| format!("Please log in first (see {})", EntryPoint::Login))
}

fn print_product(product: &Product) {
    let category = product.category.as_ref().map(Category::as_str).unwrap_or("-");

    println!(
        "{}\t{}\t{}\t{}\t{}",
        product.id,
        product.title,
        category,
        product.weight,
        format_price(product.price)
    );
}

fn print_cart(shop: &Shop) {
    for item in shop.cart().items() {
        let id = item.id.as_ref().map(|id| id.as_str()).unwrap_or("-");
        println!(
            "{}\t{} x {}\t{}",
            id,
            item.quantity,
            item.product.title,
            format_price(item.subtotal())
        );
    }
    println!("Total: {}", format_price(shop.total_price()));
}

fn print_order(order: &Order) {
    println!(
        "#{}\t{}\t{}\t{}",
        order.id.short_reference(),
        order.status,
        format_price(order.total_amount),
        order
            .created_at
            .map(|at| at.format("%d %b %Y %H:%M").to_string())
            .unwrap_or_default()
    );
}

#[derive(Debug, StructOpt)]
struct Args {
    #[structopt(
        long = "base-url",
        env = "MOTLUPETS_BASE_URL",
        default_value = "http://localhost:3000/",
        help = "Where the storefront's REST API lives"
    )]
    base_url: Url,
    #[structopt(
        long = "admin-email",
        env = "MOTLUPETS_ADMIN_EMAIL",
        help = "Logging in with this address uses the admin endpoints"
    )]
    admin_email: Option<String>,
    #[structopt(
        long = "session",
        env = "MOTLUPETS_SESSION",
        parse(from_os_str),
        help = "Where to remember who is logged in"
    )]
    session: Option<PathBuf>,
    #[structopt(short = "e", long = "email", help = "Log in with this email first")]
    email: Option<String>,
    #[structopt(short = "p", long = "password", help = "The password to log in with")]
    password: Option<String>,
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    #[structopt(
        about = "Log in as a shopper or the admin",
        long_about = "Log in as a shopper or the admin. Only the identity (and an admin's token) is saved; shopper cookies don't outlive the command, so pass --email and --password to commands which need a live shopper session."
    )]
    Login { email: String, password: String },
    #[structopt(about = "Forget the current session")]
    Logout,
    #[structopt(about = "Create a new shopper account")]
    Register {
        name: String,
        email: String,
        password: String,
    },
    #[structopt(about = "Confirm an email address with its verification code")]
    VerifyOtp { email: String, otp: String },
    #[structopt(about = "Send a new verification code")]
    ResendOtp { email: String },
    #[structopt(about = "List the catalogue")]
    Products {
        #[structopt(long = "category", help = "Only show products for \"Cat\" or \"Dog\"")]
        category: Option<Category>,
    },
    #[structopt(about = "Show a single product")]
    Product { id: ProductId },
    #[structopt(about = "Show your cart")]
    Cart,
    CartAdd { product: ProductId },
    CartRemove { product: ProductId },
    #[structopt(about = "Change a cart line's quantity by a relative amount")]
    CartQty {
        item: CartItemId,
        #[structopt(allow_hyphen_values = true)]
        change: i32,
    },
    Wishlist,
    WishlistAdd { product: ProductId },
    WishlistRemove { product: ProductId },
    #[structopt(about = "List your orders")]
    Orders,
    CancelOrder { order: OrderId },
    #[structopt(about = "Order everything in your cart, paying on delivery")]
    CheckoutCod(Delivery),
    #[structopt(about = "Ask for help with an order")]
    Support { order: OrderId, message: String },
    AdminStats,
    AdminUsers,
    AdminOrders,
    AdminSetStatus {
        order: OrderId,
        #[structopt(parse(from_str = parse_status))]
        status: OrderStatus,
    },
}

#[derive(Debug, StructOpt)]
struct Delivery {
    #[structopt(long = "name")]
    full_name: String,
    #[structopt(long = "phone")]
    phone_number: String,
    #[structopt(long = "email")]
    email: String,
    #[structopt(long = "street")]
    street_address: String,
    #[structopt(long = "city")]
    city: String,
    #[structopt(long = "state")]
    state: String,
    #[structopt(long = "pincode")]
    pincode: String,
    #[structopt(long = "instructions", default_value = "")]
    special_instructions: String,
}

impl Delivery {
    fn into_form(self) -> CheckoutForm {
        CheckoutForm {
            full_name: self.full_name,
            phone_number: self.phone_number,
            email: self.email,
            street_address: self.street_address,
            city: self.city,
            state: self.state,
            pincode: self.pincode,
            special_instructions: self.special_instructions,
            payment_method: PaymentMethod::Cod,
        }
    }
}

fn parse_status(src: &str) -> OrderStatus { OrderStatus::from(src.to_string()) }

//! Built-in sample catalog and the read-only views derived from it.

use crate::model::{Book, Category, Condition};
use chrono::NaiveDate;

pub const RELATED_LIMIT: usize = 8;

pub fn categories() -> Vec<Category> {
    [
        ("fiction", "Fiction", 234),
        ("non-fiction", "Non-Fiction", 156),
        ("science", "Science & Technology", 89),
        ("arts", "Arts & Photography", 112),
        ("business", "Business & Economics", 67),
        ("children", "Children's Books", 198),
        ("comics", "Comics & Graphic Novels", 76),
        ("education", "Education & Teaching", 45),
    ]
    .into_iter()
    .map(|(id, name, count)| Category {
        id: id.to_string(),
        name: name.to_string(),
        count,
    })
    .collect()
}

struct Seed {
    id: &'static str,
    title: &'static str,
    author: &'static str,
    description: &'static str,
    price: f64,
    original_price: Option<f64>,
    condition: Condition,
    category: &'static [&'static str],
    cover: &'static str,
    seller: &'static str,
    rating: f32,
    location: &'static str,
    added: (i32, u32, u32),
    featured: bool,
    best_seller: bool,
}

const SEEDS: &[Seed] = &[
    Seed {
        id: "1",
        title: "The Midnight Library",
        author: "Matt Haig",
        description: "Between life and death there is a library, and within that library, the shelves go on forever. Every book provides a chance to try another life you could have lived. To see how things would be if you had made other choices... Would you have done anything different, if you had the chance to undo your regrets?",
        price: 14.99,
        original_price: Some(24.99),
        condition: Condition::LikeNew,
        category: &["fiction", "fantasy"],
        cover: "https://images.unsplash.com/photo-1544947950-fa07a98d237f?auto=format&fit=crop&q=80&w=387&h=580",
        seller: "Book Haven",
        rating: 4.8,
        location: "Seattle, WA",
        added: (2023, 10, 12),
        featured: true,
        best_seller: true,
    },
    Seed {
        id: "2",
        title: "Atomic Habits",
        author: "James Clear",
        description: "No matter your goals, Atomic Habits offers a proven framework for improving--every day. James Clear, one of the world's leading experts on habit formation, reveals practical strategies that will teach you exactly how to form good habits, break bad ones, and master the tiny behaviors that lead to remarkable results.",
        price: 18.99,
        original_price: None,
        condition: Condition::New,
        category: &["non-fiction", "self-help"],
        cover: "https://images.unsplash.com/photo-1571167530149-c1105da82639?auto=format&fit=crop&q=80&w=376&h=580",
        seller: "PageTurner Books",
        rating: 4.9,
        location: "Portland, OR",
        added: (2023, 10, 5),
        featured: true,
        best_seller: false,
    },
    Seed {
        id: "3",
        title: "Project Hail Mary",
        author: "Andy Weir",
        description: "Ryland Grace is the sole survivor on a desperate, last-chance mission - and if he fails, humanity and the earth itself will perish. Except that right now, he doesn't know that. He can't even remember his own name, let alone the nature of his assignment or how to complete it.",
        price: 22.50,
        original_price: Some(28.99),
        condition: Condition::New,
        category: &["fiction", "science-fiction"],
        cover: "https://images.unsplash.com/photo-1629992101753-56d196c8aabb?auto=format&fit=crop&q=80&w=390&h=580",
        seller: "Nebula Books",
        rating: 4.7,
        location: "Austin, TX",
        added: (2023, 9, 28),
        featured: false,
        best_seller: true,
    },
    Seed {
        id: "4",
        title: "Educated",
        author: "Tara Westover",
        description: "An unforgettable memoir about a young girl who, kept out of school, leaves her survivalist family and goes on to earn a PhD from Cambridge University.",
        price: 12.99,
        original_price: Some(17.99),
        condition: Condition::Good,
        category: &["non-fiction", "memoir", "biography"],
        cover: "https://images.unsplash.com/photo-1589998059171-988d887df646?auto=format&fit=crop&q=80&w=376&h=580",
        seller: "Memoir Depot",
        rating: 4.5,
        location: "Boston, MA",
        added: (2023, 10, 1),
        featured: false,
        best_seller: false,
    },
    Seed {
        id: "5",
        title: "The Psychology of Money",
        author: "Morgan Housel",
        description: "Timeless lessons on wealth, greed, and happiness doing well with money isn't necessarily about what you know. It's about how you behave. And behavior is hard to teach, even to really smart people.",
        price: 15.99,
        original_price: None,
        condition: Condition::New,
        category: &["business", "finance", "self-help"],
        cover: "https://images.unsplash.com/photo-1592496431122-2349e0fbc666?auto=format&fit=crop&q=80&w=386&h=580",
        seller: "Finance Reads",
        rating: 4.6,
        location: "Chicago, IL",
        added: (2023, 9, 25),
        featured: true,
        best_seller: false,
    },
    Seed {
        id: "6",
        title: "The Great Gatsby",
        author: "F. Scott Fitzgerald",
        description: "A true classic of American literature, The Great Gatsby is a vivid and witty portrait of the American dream and its corruption.",
        price: 9.99,
        original_price: None,
        condition: Condition::Fair,
        category: &["fiction", "classics"],
        cover: "https://images.unsplash.com/photo-1543002588-bfa74002ed7e?auto=format&fit=crop&q=80&w=387&h=580",
        seller: "Classic Library",
        rating: 4.4,
        location: "New York, NY",
        added: (2023, 9, 15),
        featured: false,
        best_seller: false,
    },
    Seed {
        id: "7",
        title: "Sapiens: A Brief History of Humankind",
        author: "Yuval Noah Harari",
        description: "From a renowned historian comes a groundbreaking narrative of humanity's creation and evolution that explores the ways in which biology and history have defined us.",
        price: 19.99,
        original_price: None,
        condition: Condition::LikeNew,
        category: &["non-fiction", "history", "science"],
        cover: "https://images.unsplash.com/photo-1503830469095-092a4a4e525e?auto=format&fit=crop&q=80&w=380&h=580",
        seller: "History Hub",
        rating: 4.9,
        location: "San Francisco, CA",
        added: (2023, 10, 8),
        featured: false,
        best_seller: true,
    },
    Seed {
        id: "8",
        title: "The Alchemist",
        author: "Paulo Coelho",
        description: "Paulo Coelho's masterpiece tells the mystical story of Santiago, an Andalusian shepherd boy who yearns to travel in search of a worldly treasure.",
        price: 11.50,
        original_price: Some(14.99),
        condition: Condition::Good,
        category: &["fiction", "fantasy", "spiritual"],
        cover: "https://images.unsplash.com/photo-1544947950-fa07a98d237f?auto=format&fit=crop&q=80&w=387&h=580",
        seller: "Spiritual Books",
        rating: 4.7,
        location: "Denver, CO",
        added: (2023, 9, 20),
        featured: false,
        best_seller: false,
    },
];

/// The eight sample listings shipped with the marketplace.
pub fn sample_books() -> Vec<Book> {
    SEEDS
        .iter()
        .map(|s| Book {
            id: s.id.to_string(),
            title: s.title.to_string(),
            author: s.author.to_string(),
            description: s.description.to_string(),
            price: s.price,
            original_price: s.original_price,
            condition: s.condition,
            category: s.category.iter().map(|c| c.to_string()).collect(),
            cover_image: s.cover.to_string(),
            seller_name: s.seller.to_string(),
            seller_rating: s.rating,
            location: s.location.to_string(),
            date_added: NaiveDate::from_ymd_opt(s.added.0, s.added.1, s.added.2)
                .unwrap_or_default(),
            featured: s.featured,
            best_seller: s.best_seller,
        })
        .collect()
}

pub fn featured(books: &[Book]) -> Vec<Book> {
    books.iter().filter(|b| b.featured).cloned().collect()
}

pub fn best_sellers(books: &[Book]) -> Vec<Book> {
    books.iter().filter(|b| b.best_seller).cloned().collect()
}

/// Other books sharing at least one tag with `book`, in catalog order.
pub fn related(books: &[Book], book: &Book, limit: usize) -> Vec<Book> {
    books
        .iter()
        .filter(|b| b.id != book.id && b.has_any_category(&book.category))
        .take(limit)
        .cloned()
        .collect()
}

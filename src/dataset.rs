//! Bundled mock dataset used when no backend is configured.

use jiff::Timestamp;

use crate::types::{Author, BlogPost, Category, ItemId, PujaService};

fn ts(s: &str) -> Timestamp {
    // Literals below are all valid RFC 3339
    s.parse().unwrap_or(Timestamp::UNIX_EPOCH)
}

fn author(slug: &str, name: &str) -> Author {
    Author {
        slug: slug.to_string(),
        name: name.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn post(
    id: u64,
    title: &str,
    excerpt: &str,
    author: Author,
    category: &str,
    tags: &[&str],
    featured: bool,
    views: u64,
    likes: u64,
    created_at: &str,
    published_at: Option<&str>,
) -> BlogPost {
    BlogPost {
        id: ItemId(id),
        title: title.to_string(),
        slug: crate::types::slugify(title),
        excerpt: excerpt.to_string(),
        content: format!("{excerpt} Read on for the full guide."),
        author,
        category: category.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        featured,
        views,
        likes,
        created_at: ts(created_at),
        published_at: published_at.map(ts),
    }
}

/// Blog posts shown on the public blog
pub fn blog_posts() -> Vec<BlogPost> {
    let ravi = author("pandit-ravi", "Pandit Ravi Shastri");
    let priya = author("priya-sharma", "Priya Sharma");
    let anand = author("anand-iyer", "Anand Iyer");

    vec![
        post(
            1,
            "Diwali Guide",
            "How to prepare your home and altar for Lakshmi puja on Diwali.",
            ravi.clone(),
            "festivals",
            &["diwali", "lakshmi", "rituals"],
            true,
            2156,
            342,
            "2024-10-20T06:00:00Z",
            Some("2024-10-22T06:00:00Z"),
        ),
        post(
            2,
            "Meditation 101",
            "A gentle start to daily dhyana practice with breath and mantra.",
            priya.clone(),
            "meditation",
            &["meditation", "mantra"],
            false,
            892,
            120,
            "2024-09-02T08:30:00Z",
            None,
        ),
        post(
            3,
            "Understanding Shani Sade Sati",
            "What the seven-and-a-half year Saturn transit means for your chart.",
            anand.clone(),
            "astrology",
            &["planets", "saturn"],
            true,
            1740,
            210,
            "2024-08-14T10:00:00Z",
            Some("2024-08-15T10:00:00Z"),
        ),
        post(
            4,
            "Navratri Fasting Rules",
            "Foods to eat and avoid across the nine nights of the goddess.",
            priya.clone(),
            "festivals",
            &["navratri", "fasting"],
            false,
            1310,
            198,
            "2024-09-28T05:00:00Z",
            None,
        ),
        post(
            5,
            "Choosing a Muhurat for Griha Pravesh",
            "Picking an auspicious date and time for moving into a new home.",
            ravi.clone(),
            "astrology",
            &["muhurat", "planets"],
            false,
            640,
            75,
            "2024-07-01T09:00:00Z",
            None,
        ),
        post(
            6,
            "Ganesh Chaturthi at Home",
            "Step-by-step sthapana and visarjan for an eco-friendly murti.",
            ravi,
            "festivals",
            &["ganesh", "rituals"],
            true,
            1980,
            301,
            "2024-09-01T04:00:00Z",
            Some("2024-09-03T04:00:00Z"),
        ),
        post(
            7,
            "Mantra Japa with a Mala",
            "Counting 108 repetitions and caring for your rudraksha mala.",
            anand,
            "meditation",
            &["mantra", "meditation"],
            false,
            455,
            66,
            "2024-06-11T07:45:00Z",
            None,
        ),
        post(
            8,
            "Rahu and Ketu Explained",
            "The shadow planets, their axis and common remedies.",
            priya,
            "astrology",
            &["planets"],
            false,
            1120,
            140,
            "2024-05-20T12:00:00Z",
            None,
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn service(
    id: u64,
    title: &str,
    description: &str,
    category: (u64, &str),
    service_type: &str,
    price: f64,
    duration: u32,
    is_active: bool,
    created_at: &str,
) -> PujaService {
    PujaService {
        id: ItemId(id),
        title: title.to_string(),
        description: description.to_string(),
        category: ItemId(category.0),
        category_name: category.1.to_string(),
        service_type: service_type.to_string(),
        price,
        duration,
        is_active,
        created_at: ts(created_at),
        updated_at: None,
    }
}

/// Puja services offered for booking
pub fn puja_services() -> Vec<PujaService> {
    let griha = (1, "Griha Puja");
    let graha = (2, "Graha Shanti");
    let festival = (3, "Festival Puja");

    vec![
        service(
            1,
            "Satyanarayan Puja",
            "Full moon katha and puja for prosperity, performed by two pandits.",
            griha,
            "home",
            5100.0,
            150,
            true,
            "2024-01-10T09:00:00Z",
        ),
        service(
            2,
            "Griha Pravesh Puja",
            "Vastu shanti and havan for entering a new home.",
            griha,
            "home",
            11000.0,
            240,
            true,
            "2024-01-12T09:00:00Z",
        ),
        service(
            3,
            "Navagraha Shanti",
            "Pacify all nine planets with mantra japa and havan.",
            graha,
            "temple",
            7500.0,
            180,
            true,
            "2024-02-01T09:00:00Z",
        ),
        service(
            4,
            "Shani Dosh Nivaran",
            "Saturday remedy puja for Sade Sati and Shani dhaiya.",
            graha,
            "online",
            2100.0,
            90,
            true,
            "2024-02-15T09:00:00Z",
        ),
        service(
            5,
            "Lakshmi Puja for Diwali",
            "Evening Diwali puja with kuber yantra sthapana.",
            festival,
            "home",
            3100.0,
            120,
            true,
            "2024-03-01T09:00:00Z",
        ),
        service(
            6,
            "Rudrabhishek",
            "Abhishek of the Shiva linga with panchamrit and Rudram chanting.",
            festival,
            "temple",
            4100.0,
            120,
            false,
            "2024-03-20T09:00:00Z",
        ),
        service(
            7,
            "Kaal Sarp Dosh Puja",
            "Remedy for the Rahu-Ketu axis at a Trimbakeshwar-trained pandit's temple.",
            graha,
            "temple",
            6100.0,
            180,
            true,
            "2024-04-05T09:00:00Z",
        ),
        service(
            8,
            "Online Ganesh Puja",
            "Live-streamed Ganesh puja with sankalp in your name.",
            festival,
            "online",
            1100.0,
            60,
            false,
            "2024-04-18T09:00:00Z",
        ),
    ]
}

/// Service categories
pub fn categories() -> Vec<Category> {
    [
        (1, "Griha Puja", true),
        (2, "Graha Shanti", true),
        (3, "Festival Puja", true),
        (4, "Samskara", false),
    ]
    .into_iter()
    .map(|(id, name, is_active)| Category {
        id: ItemId(id),
        name: name.to_string(),
        slug: crate::types::slugify(name),
        is_active,
        created_at: ts("2024-01-01T00:00:00Z"),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let post_ids: HashSet<_> = blog_posts().iter().map(|p| p.id).collect();
        assert_eq!(post_ids.len(), blog_posts().len());

        let service_ids: HashSet<_> = puja_services().iter().map(|s| s.id).collect();
        assert_eq!(service_ids.len(), puja_services().len());
    }

    #[test]
    fn test_timestamps_parse() {
        assert!(
            blog_posts()
                .iter()
                .all(|p| p.created_at != Timestamp::UNIX_EPOCH)
        );
    }

    #[test]
    fn test_service_categories_exist() {
        let category_ids: HashSet<_> = categories().iter().map(|c| c.id).collect();
        assert!(
            puja_services()
                .iter()
                .all(|s| category_ids.contains(&s.category))
        );
    }
}

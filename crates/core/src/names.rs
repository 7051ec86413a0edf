//! Built-in first-name pools used to generate replacement names.

pub const MALE_FIRST_NAMES: &[&str] = &[
    "Aaron", "Adrian", "Alex", "Andrew", "Anthony", "Arthur", "Benjamin", "Blake",
    "Bradley", "Caleb", "Cameron", "Carlos", "Charles", "Christian", "Colin", "Daniel",
    "David", "Dominic", "Dylan", "Edward", "Elliot", "Eric", "Ethan", "Felix",
    "Gabriel", "George", "Gordon", "Harold", "Henry", "Hugo", "Isaac", "Ivan",
    "Jack", "Jacob", "James", "Jason", "Jeremy", "Joel", "Jonah", "Joseph",
    "Julian", "Kevin", "Leon", "Liam", "Lucas", "Marcus", "Martin", "Matthew",
    "Miles", "Nathan", "Noah", "Oliver", "Oscar", "Owen", "Patrick", "Peter",
    "Philip", "Quentin", "Raymond", "Robert", "Ryan", "Sebastian", "Simon", "Stanley",
    "Theo", "Thomas", "Tobias", "Victor", "Vincent", "Walter", "Wesley", "William",
];

pub const FEMALE_FIRST_NAMES: &[&str] = &[
    "Abigail", "Alice", "Amelia", "Aria", "Audrey", "Beatrice", "Bella", "Brooke",
    "Camila", "Caroline", "Charlotte", "Chloe", "Claire", "Daisy", "Diana", "Eleanor",
    "Elena", "Eliza", "Emily", "Emma", "Eva", "Fiona", "Freya", "Grace",
    "Hannah", "Harper", "Hazel", "Iris", "Isabel", "Ivy", "Jade", "Julia",
    "Kate", "Laura", "Leah", "Lily", "Lucy", "Lydia", "Madeline", "Maya",
    "Megan", "Mia", "Naomi", "Natalie", "Nina", "Nora", "Olivia", "Paige",
    "Penelope", "Quinn", "Rachel", "Rose", "Ruby", "Sadie", "Sarah", "Scarlett",
    "Sophie", "Stella", "Tessa", "Valerie", "Vera", "Violet", "Willow", "Zoe",
];
